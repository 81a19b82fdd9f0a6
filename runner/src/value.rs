use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use elicit::{Table, TextBlock};

/// Identity of a Rust type used as a step parameter.
#[derive(Clone, Copy)]
pub struct TypeTag {
    id: TypeId,
    name: &'static str,
}

impl TypeTag {
    pub fn of<T: 'static>() -> Self {
        TypeTag {
            id: TypeId::of::<T>(),
            name: short_type_name(std::any::type_name::<T>()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// `alloc::string::String` reads as `String`. Generic names are kept whole.
fn short_type_name(full: &'static str) -> &'static str {
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// The declared type of one step-implementation parameter, fixed at
/// registration. Matching compares tags; nothing is reflected at run time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamType {
    /// The step context. Always the first parameter.
    Context,
    Table,
    TextBlock,
    /// A value converted from one captured string.
    Value(TypeTag),
    /// A comma-separated capture, converted element by element.
    List(Box<ParamType>),
}

impl ParamType {
    pub fn value<T: 'static>() -> Self {
        ParamType::Value(TypeTag::of::<T>())
    }

    /// Tables and text blocks come from the step's attachments, not from
    /// captures.
    pub fn is_attachment(&self) -> bool {
        matches!(self, ParamType::Table | ParamType::TextBlock)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamType::Context => write!(f, "&mut StepContext"),
            ParamType::Table => write!(f, "Table"),
            ParamType::TextBlock => write!(f, "TextBlock"),
            ParamType::Value(tag) => write!(f, "{}", tag.name()),
            ParamType::List(inner) => write!(f, "Vec<{}>", inner),
        }
    }
}

/// Render a whole signature as `fn(&mut StepContext, i64, Table)`.
pub fn signature_string(signature: &[ParamType]) -> String {
    let params: Vec<String> = signature.iter().map(ToString::to_string).collect();
    format!("fn({})", params.join(", "))
}

/// A converted argument on its way to a step implementation.
pub enum Arg {
    Value(Box<dyn Any>),
    List(Vec<Arg>),
    Table(Table),
    TextBlock(TextBlock),
}

impl Arg {
    pub fn value<T: 'static>(value: T) -> Self {
        Arg::Value(Box::new(value))
    }

    /// Take the value out if it has type `T`.
    pub fn downcast<T: 'static>(self) -> Option<T> {
        match self {
            Arg::Value(boxed) => boxed.downcast::<T>().ok().map(|b| *b),
            _ => None,
        }
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Value(_) => write!(f, "Value(..)"),
            Arg::List(items) => f.debug_tuple("List").field(items).finish(),
            Arg::Table(table) => f.debug_tuple("Table").field(table).finish(),
            Arg::TextBlock(block) => f.debug_tuple("TextBlock").field(block).finish(),
        }
    }
}

/// A type a step implementation can take as a parameter.
///
/// Implemented for the common scalars, [`Table`], [`TextBlock`] and `Vec<T>`.
/// Use [`scalar_arg!`](crate::scalar_arg) for your own types and register a
/// transform that produces them.
pub trait StepArg: Sized + 'static {
    fn param_type() -> ParamType;
    fn from_arg(arg: Arg) -> Option<Self>;
}

/// Implement [`StepArg`] for types produced whole by a single transform.
#[macro_export]
macro_rules! scalar_arg {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::StepArg for $ty {
                fn param_type() -> $crate::ParamType {
                    $crate::ParamType::value::<$ty>()
                }

                fn from_arg(arg: $crate::Arg) -> Option<Self> {
                    arg.downcast::<$ty>()
                }
            }
        )+
    };
}

scalar_arg!(String, i32, i64, u32, u64, usize, f64, bool);

impl StepArg for Table {
    fn param_type() -> ParamType {
        ParamType::Table
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::Table(table) => Some(table),
            _ => None,
        }
    }
}

impl StepArg for TextBlock {
    fn param_type() -> ParamType {
        ParamType::TextBlock
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::TextBlock(block) => Some(block),
            _ => None,
        }
    }
}

impl<T: StepArg> StepArg for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::List(Box::new(T::param_type()))
    }

    fn from_arg(arg: Arg) -> Option<Self> {
        match arg {
            Arg::List(items) => items.into_iter().map(T::from_arg).collect(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_compare_by_type() {
        assert_eq!(ParamType::value::<i64>(), i64::param_type());
        assert_ne!(ParamType::value::<i64>(), ParamType::value::<i32>());
        assert_eq!(
            Vec::<i64>::param_type(),
            ParamType::List(Box::new(ParamType::value::<i64>()))
        );
    }

    #[test]
    fn list_args_rebuild_vectors() {
        let arg = Arg::List(vec![Arg::value(1i64), Arg::value(2i64)]);
        assert_eq!(Vec::<i64>::from_arg(arg), Some(vec![1, 2]));

        let mixed = Arg::List(vec![Arg::value(1i64), Arg::value("x".to_string())]);
        assert_eq!(Vec::<i64>::from_arg(mixed), None);
    }

    #[test]
    fn signature_rendering() {
        let sig = vec![ParamType::Context, i64::param_type(), ParamType::Table];
        assert_eq!(signature_string(&sig), "fn(&mut StepContext, i64, Table)");
        let list = vec![ParamType::Context, Vec::<String>::param_type()];
        assert_eq!(signature_string(&list), "fn(&mut StepContext, Vec<String>)");
    }
}
