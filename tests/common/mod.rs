//! Calculator IR shared by the integration tests.

#![allow(dead_code)]

use trellis_ir::{FieldValue, Fields, Leaf, Symbol, TreeNode, ValidationError};

#[derive(Clone, Debug, PartialEq)]
pub enum Calc {
    Int(i64),
    Add(Box<Calc>, Box<Calc>),
    Mul(Box<Calc>, Box<Calc>),
    Pow(Box<Calc>, Box<Calc>),
    Program(Box<Calc>),
}

pub fn int(v: i64) -> Calc {
    Calc::Int(v)
}

pub fn add(l: Calc, r: Calc) -> Calc {
    Calc::Add(Box::new(l), Box::new(r))
}

pub fn mul(l: Calc, r: Calc) -> Calc {
    Calc::Mul(Box::new(l), Box::new(r))
}

pub fn pow(l: Calc, r: Calc) -> Calc {
    Calc::Pow(Box::new(l), Box::new(r))
}

pub fn program(e: Calc) -> Calc {
    Calc::Program(Box::new(e))
}

impl Calc {
    fn binary_parts(&self) -> Option<(&Calc, &Calc)> {
        match self {
            Calc::Add(l, r) | Calc::Mul(l, r) | Calc::Pow(l, r) => {
                Some((l.as_ref(), r.as_ref()))
            }
            _ => None,
        }
    }

    fn rebuild_binary(&self, fields: &mut Fields<Calc>) -> Result<(Calc, Calc), ValidationError> {
        let variant = self.variant();
        let l = match fields.take("left") {
            Some(FieldValue::Node(e)) => e,
            _ => return Err(ValidationError::missing_field(variant, "left")),
        };
        let r = match fields.take("right") {
            Some(FieldValue::Node(e)) => e,
            _ => return Err(ValidationError::missing_field(variant, "right")),
        };
        Ok((l, r))
    }
}

impl TreeNode for Calc {
    fn variant(&self) -> Symbol {
        Symbol::new(match self {
            Calc::Int(_) => "Int",
            Calc::Add(_, _) => "Add",
            Calc::Mul(_, _) => "Mul",
            Calc::Pow(_, _) => "Pow",
            Calc::Program(_) => "Program",
        })
    }

    fn fields(&self) -> Fields<Self> {
        match self {
            Calc::Int(v) => Fields::new().with("value", FieldValue::Leaf(Leaf::Int(*v))),
            Calc::Program(e) => Fields::new().with("expr", FieldValue::Node((**e).clone())),
            _ => {
                let (l, r) = self.binary_parts().expect("binary variant");
                Fields::new()
                    .with("left", FieldValue::Node(l.clone()))
                    .with("right", FieldValue::Node(r.clone()))
            }
        }
    }

    fn rebuild(&self, mut fields: Fields<Self>) -> Result<Self, ValidationError> {
        let variant = self.variant();
        let node = match self {
            Calc::Int(_) => match fields.take("value") {
                Some(FieldValue::Leaf(Leaf::Int(v))) => Calc::Int(v),
                _ => return Err(ValidationError::missing_field(variant, "value")),
            },
            Calc::Program(_) => match fields.take("expr") {
                Some(FieldValue::Node(e)) => program(e),
                _ => return Err(ValidationError::missing_field(variant, "expr")),
            },
            Calc::Add(_, _) => {
                let (l, r) = self.rebuild_binary(&mut fields)?;
                add(l, r)
            }
            Calc::Mul(_, _) => {
                let (l, r) = self.rebuild_binary(&mut fields)?;
                mul(l, r)
            }
            Calc::Pow(_, _) => {
                let (l, r) = self.rebuild_binary(&mut fields)?;
                pow(l, r)
            }
        };
        match fields.keys().next() {
            Some(extra) => Err(ValidationError::unexpected_field(variant, extra)),
            None => Ok(node),
        }
    }
}

/// Reverse every ordered child list, recursively.
pub fn mirror(t: &Calc) -> Calc {
    match t {
        Calc::Int(v) => Calc::Int(*v),
        Calc::Add(l, r) => add(mirror(r), mirror(l)),
        Calc::Mul(l, r) => mul(mirror(r), mirror(l)),
        Calc::Pow(l, r) => pow(mirror(r), mirror(l)),
        Calc::Program(e) => program(mirror(e)),
    }
}

pub fn node_count(t: &Calc) -> usize {
    match t {
        Calc::Int(_) => 1,
        Calc::Add(l, r) | Calc::Mul(l, r) | Calc::Pow(l, r) => 1 + node_count(l) + node_count(r),
        Calc::Program(e) => 1 + node_count(e),
    }
}

/// Compact label for visit-order assertions: variant name, plus the value
/// for literals.
pub fn describe(t: &Calc) -> String {
    match t {
        Calc::Int(v) => format!("Int({})", v),
        Calc::Add(_, _) => "Add".to_owned(),
        Calc::Mul(_, _) => "Mul".to_owned(),
        Calc::Pow(_, _) => "Pow".to_owned(),
        Calc::Program(_) => "Program".to_owned(),
    }
}

/// The running example: `Program(Add(Int(1), Mul(Int(2), Pow(Int(3), Int(4)))))`.
pub fn sample_program() -> Calc {
    program(add(int(1), mul(int(2), pow(int(3), int(4)))))
}
