//! Native functions installed in the global scope.

use crate::env::Environment;
use crate::interp::{Interpreter, Interrupt, RuntimeError};
use crate::value::{Arity, NativeFn, NativeImpl, Value};
use rand::Rng;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn install(env: &Rc<RefCell<Environment>>) {
    let defs: &[(&'static str, Arity, NativeImpl)] = &[
        // Core.
        ("clock", Arity::Exact(0), native_clock),
        ("len", Arity::Exact(1), native_len),
        ("str", Arity::Exact(1), native_str),
        ("num", Arity::Exact(1), native_num),
        ("type", Arity::Exact(1), native_type),
        ("print", Arity::AtLeast(0), native_print),
        ("range", Arity::Range(1, 3), native_range),
        ("input", Arity::Range(0, 1), native_input),
        // Arrays.
        ("push", Arity::Exact(2), native_push),
        ("pop", Arity::Exact(1), native_pop),
        ("contains", Arity::Exact(2), native_contains),
        ("index_of", Arity::Exact(2), native_index_of),
        ("reverse", Arity::Exact(1), native_reverse),
        ("sort", Arity::Exact(1), native_sort),
        ("slice", Arity::Exact(3), native_slice),
        ("map", Arity::Exact(2), native_map),
        ("filter", Arity::Exact(2), native_filter),
        ("reduce", Arity::Range(2, 3), native_reduce),
        // Strings.
        ("substr", Arity::Exact(3), native_substr),
        ("split", Arity::Exact(2), native_split),
        ("join", Arity::Exact(2), native_join),
        ("upper", Arity::Exact(1), native_upper),
        ("lower", Arity::Exact(1), native_lower),
        ("trim", Arity::Exact(1), native_trim),
        ("replace", Arity::Exact(3), native_replace),
        ("ord", Arity::Exact(1), native_ord),
        ("chr", Arity::Exact(1), native_chr),
        // Math.
        ("floor", Arity::Exact(1), native_floor),
        ("ceil", Arity::Exact(1), native_ceil),
        ("round", Arity::Exact(1), native_round),
        ("abs", Arity::Exact(1), native_abs),
        ("sqrt", Arity::Exact(1), native_sqrt),
        ("pow", Arity::Exact(2), native_pow),
        ("min", Arity::Exact(2), native_min),
        ("max", Arity::Exact(2), native_max),
        ("rand", Arity::Exact(0), native_rand),
        ("randint", Arity::Exact(2), native_randint),
        // Dicts.
        ("keys", Arity::Exact(1), native_keys),
        ("values", Arity::Exact(1), native_values),
        ("remove", Arity::Exact(2), native_remove),
        // Files.
        ("read_file", Arity::Exact(1), native_read_file),
        ("write_file", Arity::Exact(2), native_write_file),
        ("append_file", Arity::Exact(2), native_append_file),
        ("read_lines", Arity::Exact(1), native_read_lines),
        // JSON.
        ("parse_json", Arity::Exact(1), native_parse_json),
        ("to_json", Arity::Exact(1), native_to_json),
        // HTTP.
        ("http_get", Arity::Exact(1), native_http_get),
        ("http_post", Arity::Exact(2), native_http_post),
    ];

    let mut scope = env.borrow_mut();
    for (name, arity, f) in defs.iter().copied() {
        scope.define(name, Value::Native(Rc::new(NativeFn { name, arity, f })));
    }
}

fn fail(line: u32, message: impl Into<String>) -> Interrupt {
    Interrupt::Error(RuntimeError {
        message: message.into(),
        line,
    })
}

fn want_number(value: &Value, line: u32, what: &str) -> Result<f64, Interrupt> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(fail(
            line,
            format!("{what} must be a number, got {}", other.type_name()),
        )),
    }
}

fn want_int(value: &Value, line: u32, what: &str) -> Result<i64, Interrupt> {
    let n = want_number(value, line, what)?;
    if n.fract() != 0.0 {
        return Err(fail(line, format!("{what} must be an integer")));
    }
    Ok(n as i64)
}

fn want_str(value: &Value, line: u32, what: &str) -> Result<Rc<str>, Interrupt> {
    match value {
        Value::Str(s) => Ok(Rc::clone(s)),
        other => Err(fail(
            line,
            format!("{what} must be a string, got {}", other.type_name()),
        )),
    }
}

fn want_array(value: &Value, line: u32, what: &str) -> Result<Rc<RefCell<Vec<Value>>>, Interrupt> {
    match value {
        Value::Array(items) => Ok(Rc::clone(items)),
        other => Err(fail(
            line,
            format!("{what} must be an array, got {}", other.type_name()),
        )),
    }
}

fn want_dict(
    value: &Value,
    line: u32,
    what: &str,
) -> Result<Rc<RefCell<BTreeMap<String, Value>>>, Interrupt> {
    match value {
        Value::Dict(entries) => Ok(Rc::clone(entries)),
        other => Err(fail(
            line,
            format!("{what} must be a dict, got {}", other.type_name()),
        )),
    }
}

fn array_value(items: Vec<Value>) -> Value {
    Value::Array(Rc::new(RefCell::new(items)))
}

// ---- core ----

fn native_clock(_: &mut Interpreter, _: Vec<Value>, _: u32) -> Result<Value, Interrupt> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    Ok(Value::Number(now.as_secs_f64()))
}

fn native_len(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let len = match &args[0] {
        Value::Str(s) => s.chars().count(),
        Value::Array(items) => items.borrow().len(),
        Value::Dict(entries) => entries.borrow().len(),
        other => {
            return Err(fail(
                line,
                format!("len takes a string, array, or dict, got {}", other.type_name()),
            ))
        }
    };
    Ok(Value::Number(len as f64))
}

fn native_str(_: &mut Interpreter, args: Vec<Value>, _: u32) -> Result<Value, Interrupt> {
    Ok(Value::string(args[0].to_string()))
}

fn native_num(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Number)
            .map_err(|_| fail(line, format!("cannot convert \"{s}\" to a number"))),
        other => Err(fail(
            line,
            format!("cannot convert a {} to a number", other.type_name()),
        )),
    }
}

fn native_type(_: &mut Interpreter, args: Vec<Value>, _: u32) -> Result<Value, Interrupt> {
    Ok(Value::string(args[0].type_name()))
}

fn native_print(interp: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let parts: Vec<String> = args.iter().map(ToString::to_string).collect();
    writeln!(interp.out, "{}", parts.join(" "))
        .map_err(|e| fail(line, format!("write failed: {e}")))?;
    Ok(Value::Nil)
}

fn native_range(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let (start, end, step) = match args.len() {
        1 => (0, want_int(&args[0], line, "range end")?, 1),
        2 => (
            want_int(&args[0], line, "range start")?,
            want_int(&args[1], line, "range end")?,
            1,
        ),
        _ => (
            want_int(&args[0], line, "range start")?,
            want_int(&args[1], line, "range end")?,
            want_int(&args[2], line, "range step")?,
        ),
    };
    if step == 0 {
        return Err(fail(line, "range step must not be zero"));
    }
    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < end) || (step < 0 && i > end) {
        items.push(Value::Number(i as f64));
        i += step;
    }
    Ok(array_value(items))
}

fn native_input(interp: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    if let Some(prompt) = args.first() {
        write!(interp.out, "{prompt}").map_err(|e| fail(line, format!("write failed: {e}")))?;
        interp
            .out
            .flush()
            .map_err(|e| fail(line, format!("write failed: {e}")))?;
    }
    let mut buf = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut buf)
        .map_err(|e| fail(line, format!("read failed: {e}")))?;
    while buf.ends_with('\n') || buf.ends_with('\r') {
        buf.pop();
    }
    Ok(Value::string(buf))
}

// ---- arrays ----

fn native_push(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "push target")?;
    items.borrow_mut().push(args[1].clone());
    Ok(args[0].clone())
}

fn native_pop(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "pop target")?;
    let popped = items.borrow_mut().pop();
    popped.ok_or_else(|| fail(line, "pop from an empty array"))
}

fn native_contains(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let found = match (&args[0], &args[1]) {
        (Value::Array(items), item) => items.borrow().iter().any(|v| v == item),
        (Value::Str(hay), Value::Str(needle)) => hay.contains(needle.as_ref()),
        (Value::Dict(entries), Value::Str(key)) => entries.borrow().contains_key(key.as_ref()),
        (other, _) => {
            return Err(fail(
                line,
                format!(
                    "contains takes a string, array, or dict, got {}",
                    other.type_name()
                ),
            ))
        }
    };
    Ok(Value::Bool(found))
}

fn native_index_of(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let position = match (&args[0], &args[1]) {
        (Value::Array(items), item) => items
            .borrow()
            .iter()
            .position(|v| v == item)
            .map(|i| i as f64),
        (Value::Str(hay), Value::Str(needle)) => hay
            .find(needle.as_ref())
            .map(|byte| hay[..byte].chars().count() as f64),
        (other, _) => {
            return Err(fail(
                line,
                format!("index_of takes a string or array, got {}", other.type_name()),
            ))
        }
    };
    Ok(Value::Number(position.unwrap_or(-1.0)))
}

fn native_reverse(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    match &args[0] {
        Value::Array(items) => {
            items.borrow_mut().reverse();
            Ok(args[0].clone())
        }
        Value::Str(s) => Ok(Value::string(s.chars().rev().collect::<String>())),
        other => Err(fail(
            line,
            format!("reverse takes a string or array, got {}", other.type_name()),
        )),
    }
}

fn native_sort(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "sort target")?;
    let mut borrowed = items.borrow_mut();
    if borrowed.iter().all(|v| matches!(v, Value::Number(_))) {
        borrowed.sort_by(|a, b| match (a, b) {
            (Value::Number(x), Value::Number(y)) => {
                x.partial_cmp(y).unwrap_or(std::cmp::Ordering::Equal)
            }
            _ => std::cmp::Ordering::Equal,
        });
    } else if borrowed.iter().all(|v| matches!(v, Value::Str(_))) {
        borrowed.sort_by(|a, b| match (a, b) {
            (Value::Str(x), Value::Str(y)) => x.cmp(y),
            _ => std::cmp::Ordering::Equal,
        });
    } else {
        return Err(fail(line, "sort needs all numbers or all strings"));
    }
    drop(borrowed);
    Ok(args[0].clone())
}

fn native_slice(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let start = want_int(&args[1], line, "slice start")?.max(0) as usize;
    let end = want_int(&args[2], line, "slice end")?.max(0) as usize;
    match &args[0] {
        Value::Array(items) => {
            let items = items.borrow();
            let end = end.min(items.len());
            let start = start.min(end);
            Ok(array_value(items[start..end].to_vec()))
        }
        Value::Str(s) => {
            let taken: String = s
                .chars()
                .skip(start)
                .take(end.saturating_sub(start))
                .collect();
            Ok(Value::string(taken))
        }
        other => Err(fail(
            line,
            format!("slice takes a string or array, got {}", other.type_name()),
        )),
    }
}

fn native_map(interp: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "map source")?;
    let snapshot: Vec<Value> = items.borrow().clone();
    let mut mapped = Vec::with_capacity(snapshot.len());
    for item in snapshot {
        mapped.push(interp.call(args[1].clone(), vec![item], line)?);
    }
    Ok(array_value(mapped))
}

fn native_filter(interp: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "filter source")?;
    let snapshot: Vec<Value> = items.borrow().clone();
    let mut kept = Vec::new();
    for item in snapshot {
        if interp
            .call(args[1].clone(), vec![item.clone()], line)?
            .truthy()
        {
            kept.push(item);
        }
    }
    Ok(array_value(kept))
}

fn native_reduce(interp: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "reduce source")?;
    let snapshot: Vec<Value> = items.borrow().clone();
    let mut iter = snapshot.into_iter();

    let mut acc = match args.get(2) {
        Some(init) => init.clone(),
        None => iter
            .next()
            .ok_or_else(|| fail(line, "reduce of an empty array needs an initial value"))?,
    };
    for item in iter {
        acc = interp.call(args[1].clone(), vec![acc, item], line)?;
    }
    Ok(acc)
}

// ---- strings ----

fn native_substr(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "substr source")?;
    let start = want_int(&args[1], line, "substr start")?.max(0) as usize;
    let count = want_int(&args[2], line, "substr length")?.max(0) as usize;
    let taken: String = s.chars().skip(start).take(count).collect();
    Ok(Value::string(taken))
}

fn native_split(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "split source")?;
    let sep = want_str(&args[1], line, "split separator")?;
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::string(c.to_string())).collect()
    } else {
        s.split(sep.as_ref()).map(Value::string).collect()
    };
    Ok(array_value(parts))
}

fn native_join(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let items = want_array(&args[0], line, "join source")?;
    let sep = want_str(&args[1], line, "join separator")?;
    let parts: Vec<String> = items.borrow().iter().map(ToString::to_string).collect();
    Ok(Value::string(parts.join(sep.as_ref())))
}

fn native_upper(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "upper source")?;
    Ok(Value::string(s.to_uppercase()))
}

fn native_lower(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "lower source")?;
    Ok(Value::string(s.to_lowercase()))
}

fn native_trim(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "trim source")?;
    Ok(Value::string(s.trim()))
}

fn native_replace(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "replace source")?;
    let from = want_str(&args[1], line, "replace pattern")?;
    let to = want_str(&args[2], line, "replace substitute")?;
    Ok(Value::string(s.replace(from.as_ref(), to.as_ref())))
}

fn native_ord(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let s = want_str(&args[0], line, "ord source")?;
    s.chars()
        .next()
        .map(|c| Value::Number(c as u32 as f64))
        .ok_or_else(|| fail(line, "ord of an empty string"))
}

fn native_chr(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let code = want_int(&args[0], line, "chr code")?;
    u32::try_from(code)
        .ok()
        .and_then(char::from_u32)
        .map(|c| Value::string(c.to_string()))
        .ok_or_else(|| fail(line, format!("{code} is not a valid character code")))
}

// ---- math ----

fn native_floor(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    Ok(Value::Number(want_number(&args[0], line, "floor")?.floor()))
}

fn native_ceil(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    Ok(Value::Number(want_number(&args[0], line, "ceil")?.ceil()))
}

fn native_round(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    Ok(Value::Number(want_number(&args[0], line, "round")?.round()))
}

fn native_abs(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    Ok(Value::Number(want_number(&args[0], line, "abs")?.abs()))
}

fn native_sqrt(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let n = want_number(&args[0], line, "sqrt")?;
    if n < 0.0 {
        return Err(fail(line, "sqrt of a negative number"));
    }
    Ok(Value::Number(n.sqrt()))
}

fn native_pow(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let base = want_number(&args[0], line, "pow base")?;
    let exp = want_number(&args[1], line, "pow exponent")?;
    Ok(Value::Number(base.powf(exp)))
}

fn native_min(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let a = want_number(&args[0], line, "min")?;
    let b = want_number(&args[1], line, "min")?;
    Ok(Value::Number(a.min(b)))
}

fn native_max(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let a = want_number(&args[0], line, "max")?;
    let b = want_number(&args[1], line, "max")?;
    Ok(Value::Number(a.max(b)))
}

fn native_rand(_: &mut Interpreter, _: Vec<Value>, _: u32) -> Result<Value, Interrupt> {
    Ok(Value::Number(rand::thread_rng().gen::<f64>()))
}

fn native_randint(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let low = want_int(&args[0], line, "randint low")?;
    let high = want_int(&args[1], line, "randint high")?;
    if low > high {
        return Err(fail(line, "randint low bound is above the high bound"));
    }
    Ok(Value::Number(rand::thread_rng().gen_range(low..=high) as f64))
}

// ---- dicts ----

fn native_keys(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let entries = want_dict(&args[0], line, "keys source")?;
    let keys: Vec<Value> = entries.borrow().keys().cloned().map(Value::string).collect();
    Ok(array_value(keys))
}

fn native_values(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let entries = want_dict(&args[0], line, "values source")?;
    let values: Vec<Value> = entries.borrow().values().cloned().collect();
    Ok(array_value(values))
}

fn native_remove(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let entries = want_dict(&args[0], line, "remove target")?;
    let key = want_str(&args[1], line, "remove key")?;
    let removed = entries.borrow_mut().remove(key.as_ref());
    Ok(removed.unwrap_or(Value::Nil))
}

// ---- files ----

fn native_read_file(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let path = want_str(&args[0], line, "read_file path")?;
    std::fs::read_to_string(path.as_ref())
        .map(Value::string)
        .map_err(|e| fail(line, format!("cannot read `{path}`: {e}")))
}

fn native_write_file(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let path = want_str(&args[0], line, "write_file path")?;
    let content = args[1].to_string();
    std::fs::write(path.as_ref(), content)
        .map(|()| Value::Nil)
        .map_err(|e| fail(line, format!("cannot write `{path}`: {e}")))
}

fn native_append_file(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let path = want_str(&args[0], line, "append_file path")?;
    let content = args[1].to_string();
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())
        .and_then(|mut file| file.write_all(content.as_bytes()))
        .map(|()| Value::Nil)
        .map_err(|e| fail(line, format!("cannot append to `{path}`: {e}")))
}

fn native_read_lines(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let path = want_str(&args[0], line, "read_lines path")?;
    let content = std::fs::read_to_string(path.as_ref())
        .map_err(|e| fail(line, format!("cannot read `{path}`: {e}")))?;
    let lines: Vec<Value> = content.lines().map(Value::string).collect();
    Ok(array_value(lines))
}

// ---- json ----

fn native_parse_json(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let text = want_str(&args[0], line, "parse_json source")?;
    let json: serde_json::Value = serde_json::from_str(text.as_ref())
        .map_err(|e| fail(line, format!("invalid JSON: {e}")))?;
    Ok(json_to_value(json))
}

fn native_to_json(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let json = value_to_json(&args[0], line)?;
    Ok(Value::string(json.to_string()))
}

fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Nil,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::string(s),
        serde_json::Value::Array(items) => {
            array_value(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(entries) => {
            let map: BTreeMap<String, Value> = entries
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect();
            Value::Dict(Rc::new(RefCell::new(map)))
        }
    }
}

fn value_to_json(value: &Value, line: u32) -> Result<serde_json::Value, Interrupt> {
    let json = match value {
        Value::Nil => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => {
            if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
                serde_json::Value::Number((*n as i64).into())
            } else {
                serde_json::Number::from_f64(*n)
                    .map(serde_json::Value::Number)
                    .ok_or_else(|| fail(line, format!("{n} has no JSON representation")))?
            }
        }
        Value::Str(s) => serde_json::Value::String(s.to_string()),
        Value::Array(items) => {
            let mut out = Vec::new();
            for item in items.borrow().iter() {
                out.push(value_to_json(item, line)?);
            }
            serde_json::Value::Array(out)
        }
        Value::Dict(entries) => {
            let mut out = serde_json::Map::new();
            for (key, item) in entries.borrow().iter() {
                out.insert(key.clone(), value_to_json(item, line)?);
            }
            serde_json::Value::Object(out)
        }
        other => {
            return Err(fail(
                line,
                format!("cannot serialize a {} to JSON", other.type_name()),
            ))
        }
    };
    Ok(json)
}

// ---- http ----

fn native_http_get(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let url = want_str(&args[0], line, "http_get url")?;
    let response = reqwest::blocking::get(url.as_ref())
        .map_err(|e| fail(line, format!("http_get failed: {e}")))?;
    http_response_value(response, line)
}

fn native_http_post(_: &mut Interpreter, args: Vec<Value>, line: u32) -> Result<Value, Interrupt> {
    let url = want_str(&args[0], line, "http_post url")?;
    let body = args[1].to_string();
    let response = reqwest::blocking::Client::new()
        .post(url.as_ref())
        .body(body)
        .send()
        .map_err(|e| fail(line, format!("http_post failed: {e}")))?;
    http_response_value(response, line)
}

fn http_response_value(
    response: reqwest::blocking::Response,
    line: u32,
) -> Result<Value, Interrupt> {
    let status = response.status().as_u16();
    let body = response
        .text()
        .map_err(|e| fail(line, format!("cannot read response body: {e}")))?;
    let mut entries = BTreeMap::new();
    entries.insert("status".to_string(), Value::Number(f64::from(status)));
    entries.insert("body".to_string(), Value::string(body));
    Ok(Value::Dict(Rc::new(RefCell::new(entries))))
}
