//! Expression-language AST.
//!
//! Built once per expression string by [`parser`](super::parser) and never
//! mutated afterwards.  Function literals are reference-counted so runtime
//! closures can share their body with the tree they came from.
//!
//! `Display` renders a fully parenthesised form, which is what the parser
//! tests compare against.

use std::fmt;
use std::rc::Rc;

// ── Operators ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Not,
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOp::Not => "!",
            PrefixOp::Neg => "-",
        })
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOp::Add => "+",
            InfixOp::Sub => "-",
            InfixOp::Mul => "*",
            InfixOp::Div => "/",
            InfixOp::Lt => "<",
            InfixOp::Gt => ">",
            InfixOp::Le => "<=",
            InfixOp::Ge => ">=",
            InfixOp::Eq => "==",
            InfixOp::Ne => "!=",
            InfixOp::And => "&&",
            InfixOp::Or => "||",
        })
    }
}

// ── Nodes ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let name = value;`
    Let { name: String, value: Expression },
    /// `return value;`
    Return(Expression),
    /// A bare expression, optionally `;`-terminated.
    Expression(Expression),
    /// `{ … }` at statement level.
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    pub parameters: Vec<String>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    Integer(i32),
    Double(f64),
    Str(String),
    Boolean(bool),
    Prefix {
        op: PrefixOp,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        op: InfixOp,
        right: Box<Expression>,
    },
    /// `name = value`.  Only identifiers are assignable.
    Assign {
        name: String,
        value: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: Block,
        alternative: Option<Block>,
    },
    Function(Rc<FunctionLiteral>),
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
}

/// A parsed expression string: a sequence of top-level statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

impl Program {
    /// Names bound at top level by `let` or plain assignment.
    ///
    /// The script parser uses this to learn which variables an `eval` tag
    /// introduces into the global environment.
    pub fn bound_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for stmt in &self.statements {
            match stmt {
                Statement::Let { name, .. } => names.push(name.as_str()),
                Statement::Expression(Expression::Assign { name, .. }) => {
                    names.push(name.as_str())
                }
                _ => {}
            }
        }
        names
    }
}

// ── Display ───────────────────────────────────────────────────────────────────

fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(sep)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for s in &self.statements {
            write!(f, "{s}")?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for s in &self.statements {
            write!(f, "{s}")?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {name} = {value};"),
            Statement::Return(value) => write!(f, "return {value};"),
            Statement::Expression(e) => write!(f, "{e}"),
            Statement::Block(b) => write!(f, "{b}"),
        }
    }
}

impl fmt::Display for FunctionLiteral {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function({}) {}", self.parameters.join(", "), self.body)
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::Integer(n) => write!(f, "{n}"),
            Expression::Double(x) => write!(f, "{x:?}"),
            Expression::Str(s) => write!(f, "{s:?}"),
            Expression::Boolean(b) => write!(f, "{b}"),
            Expression::Prefix { op, right } => write!(f, "({op}{right})"),
            Expression::Infix { left, op, right } => write!(f, "({left} {op} {right})"),
            Expression::Assign { name, value } => write!(f, "({name} = {value})"),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {condition} {consequence}")?;
                if let Some(alt) = alternative {
                    write!(f, " else {alt}")?;
                }
                Ok(())
            }
            Expression::Function(lit) => write!(f, "{lit}"),
            Expression::Call {
                function,
                arguments,
            } => write!(f, "{function}({})", join(arguments, ", ")),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_let() {
        let program = Program {
            statements: vec![Statement::Let {
                name: "x".into(),
                value: Expression::Identifier("y".into()),
            }],
        };
        assert_eq!(program.to_string(), "let x = y;");
    }

    #[test]
    fn display_nested_infix() {
        let e = Expression::Infix {
            left: Box::new(Expression::Integer(1)),
            op: InfixOp::Add,
            right: Box::new(Expression::Prefix {
                op: PrefixOp::Neg,
                right: Box::new(Expression::Double(2.5)),
            }),
        };
        assert_eq!(e.to_string(), "(1 + (-2.5))");
    }

    #[test]
    fn bound_names_top_level_only() {
        let program = Program {
            statements: vec![
                Statement::Let {
                    name: "a".into(),
                    value: Expression::Integer(1),
                },
                Statement::Expression(Expression::Assign {
                    name: "b".into(),
                    value: Box::new(Expression::Integer(2)),
                }),
                Statement::Block(Block {
                    statements: vec![Statement::Let {
                        name: "inner".into(),
                        value: Expression::Integer(3),
                    }],
                }),
            ],
        };
        assert_eq!(program.bound_names(), vec!["a", "b"]);
    }
}
