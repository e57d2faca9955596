//! Lowering of conditions, assignments and builtin calls to command lines.
//!
//! These are pure: they see only the expression and the names involved.
//! An `Err` carries a message for a diagnostic; the caller decides what to
//! emit in its place.

use crate::dsl::ast::{BinOp, CallExpr, Expr};

/// Scoreboard objective holding every Oort variable.
pub const VARS_OBJECTIVE: &str = "oort_vars";

/// `execute if|unless score ... run function <run>` for `condition`.
pub fn condition(condition: &Expr, run: &str) -> Result<String, String> {
    let Expr::Binary { left, op, right } = condition else {
        return Err(format!(
            "unsupported condition '{}': expected a comparison",
            format_expr(condition)
        ));
    };
    let Expr::Ident(var) = left.as_ref() else {
        return Err(format!(
            "unsupported condition '{}': left side must be a variable",
            format_expr(condition)
        ));
    };

    match right.as_ref() {
        Expr::Int(n) => {
            let (test, range) = match op {
                BinOp::Eq => ("if", n.to_string()),
                BinOp::NotEq => ("unless", n.to_string()),
                BinOp::Lt => ("if", format!("..{}", bound(n.checked_sub(1), condition)?)),
                BinOp::LtEq => ("if", format!("..{n}")),
                BinOp::Gt => ("if", format!("{}..", bound(n.checked_add(1), condition)?)),
                BinOp::GtEq => ("if", format!("{n}..")),
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                    return Err(unsupported_operator(*op, "condition"))
                }
            };
            Ok(format!(
                "execute {test} score {var} {VARS_OBJECTIVE} matches {range} run function {run}"
            ))
        }
        Expr::Ident(other) => {
            let (test, cmp) = match op {
                BinOp::Eq => ("if", "="),
                BinOp::NotEq => ("unless", "="),
                BinOp::Lt => ("if", "<"),
                BinOp::LtEq => ("if", "<="),
                BinOp::Gt => ("if", ">"),
                BinOp::GtEq => ("if", ">="),
                BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => {
                    return Err(unsupported_operator(*op, "condition"))
                }
            };
            Ok(format!(
                "execute {test} score {var} {VARS_OBJECTIVE} {cmp} {other} {VARS_OBJECTIVE} run function {run}"
            ))
        }
        _ => Err(format!(
            "unsupported condition '{}': right side must be a number or a variable",
            format_expr(condition)
        )),
    }
}

fn bound(value: Option<i64>, condition: &Expr) -> Result<i64, String> {
    value.ok_or_else(|| format!("condition '{}' is out of range", format_expr(condition)))
}

fn unsupported_operator(op: BinOp, context: &str) -> String {
    format!("unsupported operator '{}' in {context}", op.as_str())
}

/// Scoreboard commands storing `value` into `target`.
pub fn assignment(target: &str, value: &Expr) -> Result<Vec<String>, String> {
    match value {
        Expr::Int(n) => Ok(vec![format!(
            "scoreboard players set {target} {VARS_OBJECTIVE} {n}"
        )]),
        Expr::Ident(source) => Ok(vec![copy(target, source)]),
        Expr::Binary { left, op, right } => {
            let first = match left.as_ref() {
                Expr::Int(n) => format!("scoreboard players set {target} {VARS_OBJECTIVE} {n}"),
                Expr::Ident(source) => copy(target, source),
                other => {
                    return Err(format!(
                        "unsupported assignment to '{target}': operand '{}' is too complex",
                        format_expr(other)
                    ))
                }
            };
            let second = match (op, right.as_ref()) {
                (BinOp::Add, Expr::Int(n)) => {
                    format!("scoreboard players add {target} {VARS_OBJECTIVE} {n}")
                }
                (BinOp::Sub, Expr::Int(n)) => {
                    format!("scoreboard players remove {target} {VARS_OBJECTIVE} {n}")
                }
                (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div, Expr::Int(_) | Expr::Ident(_)) => {
                    format!(
                        "scoreboard players operation {target} {VARS_OBJECTIVE} {}= {} {VARS_OBJECTIVE}",
                        op.as_str(),
                        format_expr(right)
                    )
                }
                (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div, other) => {
                    return Err(format!(
                        "unsupported assignment to '{target}': operand '{}' is too complex",
                        format_expr(other)
                    ))
                }
                _ => return Err(unsupported_operator(*op, "assignment")),
            };
            Ok(vec![first, second])
        }
        Expr::Str(_) | Expr::Call(_) => Err(format!(
            "unsupported assignment to '{target}': only numbers, variables and arithmetic can be stored"
        )),
    }
}

fn copy(target: &str, source: &str) -> String {
    format!("scoreboard players operation {target} {VARS_OBJECTIVE} = {source} {VARS_OBJECTIVE}")
}

/// A builtin call as a raw command: `name arg arg ...`.
pub fn command(call: &CallExpr) -> String {
    let mut line = call.callee.clone();
    for arg in &call.args {
        line.push(' ');
        line.push_str(&format_expr(arg));
    }
    line
}

/// Command-argument rendering: strings unquoted, numbers as digits,
/// names bare.
pub fn format_expr(expr: &Expr) -> String {
    match expr {
        Expr::Ident(name) => name.clone(),
        Expr::Str(value) => value.clone(),
        Expr::Int(n) => n.to_string(),
        Expr::Binary { left, op, right } => {
            format!("{} {} {}", format_expr(left), op.as_str(), format_expr(right))
        }
        Expr::Call(call) => command(call),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::ast::StmtKind;
    use crate::dsl::Compiler;
    use std::path::Path;

    /// The condition of `if <src> { }`.
    fn cond(src: &str) -> Expr {
        let module = Compiler::parse(Path::new("t.oort"), &format!("if {src} {{ }}")).unwrap();
        match &module.statements[0].kind {
            StmtKind::If(stmt) => stmt.condition.clone(),
            other => panic!("expected if, got {other:?}"),
        }
    }

    fn value(src: &str) -> Expr {
        let module = Compiler::parse(Path::new("t.oort"), &format!("x = {src}")).unwrap();
        match &module.statements[0].kind {
            StmtKind::Assign(assign) => assign.value.clone(),
            other => panic!("expected assignment, got {other:?}"),
        }
    }

    #[test]
    fn literal_comparisons_become_ranges() {
        let cases = [
            ("hp == 5", "execute if score hp oort_vars matches 5 run function ns:f"),
            ("hp != 5", "execute unless score hp oort_vars matches 5 run function ns:f"),
            ("hp < 10", "execute if score hp oort_vars matches ..9 run function ns:f"),
            ("hp <= 10", "execute if score hp oort_vars matches ..10 run function ns:f"),
            ("hp > 10", "execute if score hp oort_vars matches 11.. run function ns:f"),
            ("hp >= 10", "execute if score hp oort_vars matches 10.. run function ns:f"),
            ("hp < 0", "execute if score hp oort_vars matches ..-1 run function ns:f"),
        ];
        for (src, expected) in cases {
            assert_eq!(condition(&cond(src), "ns:f").unwrap(), expected, "{src}");
        }
    }

    #[test]
    fn variable_comparisons_use_score_operators() {
        assert_eq!(
            condition(&cond("a == b"), "ns:f").unwrap(),
            "execute if score a oort_vars = b oort_vars run function ns:f"
        );
        assert_eq!(
            condition(&cond("a != b"), "ns:f").unwrap(),
            "execute unless score a oort_vars = b oort_vars run function ns:f"
        );
        assert_eq!(
            condition(&cond("a >= b"), "ns:f").unwrap(),
            "execute if score a oort_vars >= b oort_vars run function ns:f"
        );
    }

    #[test]
    fn unsupported_conditions() {
        assert!(condition(&cond("hp"), "ns:f").is_err());
        assert!(condition(&cond("1 < hp"), "ns:f").is_err());
        assert!(condition(&cond("hp + 1"), "ns:f").is_err());
        assert!(condition(&cond("hp < \"x\""), "ns:f").is_err());
        assert!(condition(&cond("hp > 9223372036854775807"), "ns:f").is_err());
    }

    #[test]
    fn simple_assignments() {
        assert_eq!(
            assignment("x", &value("5")).unwrap(),
            vec!["scoreboard players set x oort_vars 5"]
        );
        assert_eq!(
            assignment("x", &value("y")).unwrap(),
            vec!["scoreboard players operation x oort_vars = y oort_vars"]
        );
    }

    #[test]
    fn arithmetic_assignments() {
        assert_eq!(
            assignment("x", &value("x + 3")).unwrap(),
            vec![
                "scoreboard players operation x oort_vars = x oort_vars",
                "scoreboard players add x oort_vars 3",
            ]
        );
        assert_eq!(
            assignment("x", &value("y - 2")).unwrap()[1],
            "scoreboard players remove x oort_vars 2"
        );
        assert_eq!(
            assignment("x", &value("y * z")).unwrap()[1],
            "scoreboard players operation x oort_vars *= z oort_vars"
        );
        assert_eq!(
            assignment("x", &value("4 / z")).unwrap(),
            vec![
                "scoreboard players set x oort_vars 4",
                "scoreboard players operation x oort_vars /= z oort_vars",
            ]
        );
    }

    #[test]
    fn unsupported_assignments() {
        assert!(assignment("x", &value("\"text\"")).is_err());
        assert!(assignment("x", &value("f(1)")).is_err());
        assert!(assignment("x", &value("a < b")).is_err());
        assert!(assignment("x", &value("a + b + c")).is_err());
        assert!(assignment("x", &value("a + (b * c)")).is_err());
    }

    #[test]
    fn builtin_commands_format_arguments() {
        let call = CallExpr {
            callee: "tellraw".to_string(),
            args: vec![
                Expr::Str("@a".to_string()),
                Expr::Str("hello world".to_string()),
                Expr::Int(3),
            ],
        };
        assert_eq!(command(&call), "tellraw @a hello world 3");

        let bare = CallExpr {
            callee: "kill".to_string(),
            args: vec![],
        };
        assert_eq!(command(&bare), "kill");
    }
}
