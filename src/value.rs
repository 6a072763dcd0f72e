use crate::error::ValueError;
use crate::memory::{DynArray, Heap};
use crate::object::{ObjRef, ObjString};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    Nil,
    Bool(bool),
    Number(f64),
    Obj(ObjRef),
}

/// Constant pool storage.
pub type ValueArray = DynArray<Value>;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::Obj(_) => "object",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_obj(&self) -> bool {
        matches!(self, Value::Obj(_))
    }

    pub fn is_string(&self, heap: &Heap) -> bool {
        self.as_string(heap).is_ok()
    }

    pub fn is_falsey(&self) -> bool {
        match self {
            Value::Bool(b) => !b,
            Value::Nil => true,
            _ => false,
        }
    }

    pub fn as_bool(&self) -> Result<bool, ValueError> {
        match *self {
            Value::Bool(b) => Ok(b),
            _ => Err(self.mismatch("bool")),
        }
    }

    pub fn as_number(&self) -> Result<f64, ValueError> {
        match *self {
            Value::Number(n) => Ok(n),
            _ => Err(self.mismatch("number")),
        }
    }

    pub fn as_obj(&self) -> Result<ObjRef, ValueError> {
        match *self {
            Value::Obj(obj_ref) => Ok(obj_ref),
            _ => Err(self.mismatch("object")),
        }
    }

    pub fn as_string<'h>(&self, heap: &'h Heap) -> Result<&'h ObjString, ValueError> {
        heap.string(self.as_obj().map_err(|_| self.mismatch("string"))?)
    }

    fn mismatch(&self, expected: &'static str) -> ValueError {
        ValueError::TypeMismatch {
            expected,
            found: self.type_name(),
        }
    }

    /// Language-level equality: strings compare by identity, then by content.
    pub fn equals(&self, other: &Value, heap: &Heap) -> bool {
        match (self, other) {
            (Value::Obj(l), Value::Obj(r)) if l == r => true,
            (Value::Obj(_), Value::Obj(_)) => match (self.as_string(heap), other.as_string(heap)) {
                (Ok(ls), Ok(rs)) => ls.as_str() == rs.as_str(),
                _ => false,
            },
            _ => self == other,
        }
    }

    pub fn display<'h>(&self, heap: &'h Heap) -> ValueDisplay<'h> {
        ValueDisplay { value: *self, heap }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<ObjRef> for Value {
    fn from(obj_ref: ObjRef) -> Self {
        Value::Obj(obj_ref)
    }
}

pub struct ValueDisplay<'h> {
    value: Value,
    heap: &'h Heap,
}

impl fmt::Display for ValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => f.write_fmt(format_args!("{}", b)),
            Value::Number(n) => write_number(f, n),
            Value::Obj(obj_ref) => match self.heap.get(obj_ref) {
                Ok(obj) => f.write_fmt(format_args!("{}", obj)),
                Err(_) => f.write_fmt(format_args!("<dangling {}>", obj_ref.index())),
            },
        }
    }
}

/// Decimal exponents printed positionally; anything outside uses exponent form.
const POSITIONAL_EXP_MAX: i32 = 16;
const POSITIONAL_EXP_MIN: i32 = -4;

/// `%g`-style output with shortest round-trip digits: positional for
/// moderate magnitudes, otherwise `d.ddde±XX`.
fn write_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.is_nan() {
        return f.write_str("nan");
    }
    if n.is_infinite() || n == 0.0 {
        return f.write_fmt(format_args!("{}", n));
    }
    let sci = format!("{:e}", n);
    let (mantissa, exp) = match sci.split_once('e').map(|(m, e)| (m, e.parse::<i32>())) {
        Some((mantissa, Ok(exp))) => (mantissa, exp),
        _ => return f.write_fmt(format_args!("{}", n)),
    };
    if (POSITIONAL_EXP_MIN..=POSITIONAL_EXP_MAX).contains(&exp) {
        f.write_fmt(format_args!("{}", n))
    } else {
        let sign = if exp < 0 { '-' } else { '+' };
        f.write_fmt(format_args!("{}e{}{:02}", mantissa, sign, exp.abs()))
    }
}
