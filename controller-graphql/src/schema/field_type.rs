use std::borrow::Cow;

use async_graphql::dynamic::TypeRef;

use super::Entity;

// Builtin scalars are kept apart from named types so the registry knows they
// never need registering.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum FieldType {
    /// An object, interface or custom scalar, by name.
    Named(Cow<'static, str>),
    List(Box<FieldType>),
    NonNull(Box<FieldType>),
    String,
    Int,
    Boolean,
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Named(ty) => write!(f, "{ty}"),
            FieldType::List(ty) => write!(f, "[{ty}]"),
            FieldType::NonNull(ty) => write!(f, "{ty}!"),
            FieldType::String => write!(f, "String"),
            FieldType::Int => write!(f, "Int"),
            FieldType::Boolean => write!(f, "Boolean"),
        }
    }
}

impl FieldType {
    pub(crate) const fn named(name: &'static str) -> Self {
        FieldType::Named(Cow::Borrowed(name))
    }

    pub(crate) const fn of<T: Entity>() -> Self {
        FieldType::named(T::TYPE_NAME)
    }

    pub(crate) fn non_null(self) -> Self {
        FieldType::NonNull(Box::new(self))
    }

    pub(crate) fn list(self) -> Self {
        FieldType::List(Box::new(self))
    }

    pub(crate) fn is_nullable(&self) -> bool {
        !matches!(self, FieldType::NonNull(_))
    }

    /// return the name of the type on which selections happen
    ///
    /// Example if we get the field `list: [Release!]!`, it will return "Release"
    pub(crate) fn inner_type_name(&self) -> Option<&str> {
        match self {
            FieldType::Named(name) => Some(name.as_ref()),
            FieldType::List(inner) | FieldType::NonNull(inner) => inner.inner_type_name(),
            FieldType::String | FieldType::Int | FieldType::Boolean => None,
        }
    }
}

impl From<&FieldType> for TypeRef {
    fn from(ty: &FieldType) -> Self {
        match ty {
            FieldType::Named(name) => TypeRef::Named(name.clone()),
            FieldType::List(inner) => TypeRef::List(Box::new(inner.as_ref().into())),
            FieldType::NonNull(inner) => TypeRef::NonNull(Box::new(inner.as_ref().into())),
            FieldType::String => TypeRef::named(TypeRef::STRING),
            FieldType::Int => TypeRef::named(TypeRef::INT),
            FieldType::Boolean => TypeRef::named(TypeRef::BOOLEAN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_like_sdl() {
        let ty = FieldType::named("Release").non_null().list().non_null();
        assert_eq!(ty.to_string(), "[Release!]!");
        assert_eq!(ty.inner_type_name(), Some("Release"));
        assert_eq!(FieldType::Int.inner_type_name(), None);
    }

    #[test]
    fn converts_to_type_refs() {
        let ty = FieldType::String.non_null().list();
        assert_eq!(TypeRef::from(&ty).to_string(), "[String!]");
    }
}
