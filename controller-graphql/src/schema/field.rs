//! Declarative field tables and the one engine that resolves them.
//!
//! Every queryable type lists its fields as [`FieldSpec`]s. A spec names the
//! field, its result type and how the value is obtained: projected from the
//! parent, borrowed from a record embedded in the parent, derived from it, or
//! fetched through a collaborator. Null handling for absent relationships,
//! error codes, error scoping and list wrapping all live in [`resolve_field`].

use std::any::Any;
use std::borrow::Cow;
use std::future::Future;

use async_graphql::dynamic::Field;
use async_graphql::dynamic::FieldFuture;
use async_graphql::dynamic::FieldValue;
use async_graphql::dynamic::InputValue;
use async_graphql::dynamic::Interface;
use async_graphql::dynamic::InterfaceField;
use async_graphql::dynamic::Object;
use async_graphql::dynamic::ObjectAccessor;
use async_graphql::dynamic::ResolverContext;
use async_graphql::dynamic::TypeRef;
use async_graphql::ErrorExtensions;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::debug;

use super::FieldType;
use crate::error::RepoError;
use crate::error::ResolveError;
use crate::repository::Repositories;

/// A resolved value that owns everything it refers to.
pub type Node = FieldValue<'static>;

/// Arguments of the field being resolved.
pub type Args<'a> = &'a ObjectAccessor<'a>;

pub(crate) type Fetch<T> = for<'a> fn(
    &'a Repositories,
    &'a T,
    Args<'a>,
) -> BoxFuture<'a, Result<Option<Node>, ResolveError>>;

pub(crate) type FetchList<T> =
    for<'a> fn(&'a Repositories, &'a T, Args<'a>) -> BoxFuture<'a, Result<Vec<Node>, ResolveError>>;

/// A type exposed through the query surface.
pub trait Entity: Any + Send + Sync + Sized {
    const TYPE_NAME: &'static str;

    fn fields() -> Fields<Self>;

    /// Recovers the record a field is resolved on.
    fn parent<'a>(value: &'a FieldValue<'a>) -> Option<&'a Self> {
        value.downcast_ref::<Self>()
    }
}

/// Whether a missing related record is an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Presence {
    /// Not found resolves to null.
    Optional,
    /// Not found is reported on the field.
    Required,
}

pub(crate) enum Resolve<T> {
    Scalar(fn(&T) -> async_graphql::Value),
    Nested(for<'a> fn(&'a T) -> Option<FieldValue<'a>>),
    Derive(fn(&T) -> Result<Option<Node>, ResolveError>),
    One(Presence, Fetch<T>),
    Many(FetchList<T>),
}

// Derives would require `T: Clone`.
impl<T> Clone for Resolve<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Resolve<T> {}

pub(crate) struct FieldSpec<T> {
    pub(crate) name: &'static str,
    pub(crate) ty: FieldType,
    pub(crate) description: Cow<'static, str>,
    pub(crate) arguments: Vec<(&'static str, FieldType)>,
    pub(crate) resolve: Resolve<T>,
}

/// The field table of one type, built in declaration order.
pub struct Fields<T> {
    specs: Vec<FieldSpec<T>>,
}

impl<T: Entity> Default for Fields<T> {
    fn default() -> Self {
        Fields { specs: Vec::new() }
    }
}

impl<T: Entity> Fields<T> {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push(
        mut self,
        name: &'static str,
        ty: FieldType,
        description: impl Into<Cow<'static, str>>,
        resolve: Resolve<T>,
    ) -> Self {
        self.specs.push(FieldSpec {
            name,
            ty,
            description: description.into(),
            arguments: Vec::new(),
            resolve,
        });
        self
    }

    pub(crate) fn scalar(
        self,
        name: &'static str,
        ty: FieldType,
        description: &'static str,
        project: fn(&T) -> async_graphql::Value,
    ) -> Self {
        self.push(name, ty, description, Resolve::Scalar(project))
    }

    pub(crate) fn nested(
        self,
        name: &'static str,
        ty: FieldType,
        description: &'static str,
        project: for<'a> fn(&'a T) -> Option<FieldValue<'a>>,
    ) -> Self {
        self.push(name, ty, description, Resolve::Nested(project))
    }

    pub(crate) fn derived(
        self,
        name: &'static str,
        ty: FieldType,
        description: impl Into<Cow<'static, str>>,
        derive: fn(&T) -> Result<Option<Node>, ResolveError>,
    ) -> Self {
        self.push(name, ty, description, Resolve::Derive(derive))
    }

    pub(crate) fn optional(
        self,
        name: &'static str,
        ty: FieldType,
        description: &'static str,
        fetch: Fetch<T>,
    ) -> Self {
        self.push(name, ty, description, Resolve::One(Presence::Optional, fetch))
    }

    pub(crate) fn required(
        self,
        name: &'static str,
        ty: FieldType,
        description: &'static str,
        fetch: Fetch<T>,
    ) -> Self {
        self.push(name, ty, description, Resolve::One(Presence::Required, fetch))
    }

    pub(crate) fn list(
        self,
        name: &'static str,
        ty: FieldType,
        description: &'static str,
        fetch: FetchList<T>,
    ) -> Self {
        self.push(name, ty, description, Resolve::Many(fetch))
    }

    /// Adds an argument to the field declared last.
    pub(crate) fn argument(mut self, name: &'static str, ty: FieldType) -> Self {
        if let Some(spec) = self.specs.last_mut() {
            spec.arguments.push((name, ty));
        }
        self
    }

    pub(crate) fn specs(&self) -> &[FieldSpec<T>] {
        &self.specs
    }

    pub(crate) fn into_object(self, name: &str) -> Object {
        self.specs
            .into_iter()
            .fold(Object::new(name), |object, spec| object.field(spec.into_field()))
    }

    /// The same fields, declared without resolvers, for an interface.
    pub(crate) fn to_interface(&self, name: &str) -> Interface {
        self.specs.iter().fold(Interface::new(name), |interface, spec| {
            let field = spec.arguments.iter().fold(
                InterfaceField::new(spec.name, TypeRef::from(&spec.ty))
                    .description(spec.description.clone()),
                |field, (name, ty)| field.argument(InputValue::new(*name, TypeRef::from(ty))),
            );
            interface.field(field)
        })
    }
}

impl<T: Entity> FieldSpec<T> {
    fn into_field(self) -> Field {
        let FieldSpec {
            name,
            ty,
            description,
            arguments,
            resolve,
        } = self;
        let nullable = ty.is_nullable();
        let field = Field::new(name, TypeRef::from(&ty), move |ctx| {
            FieldFuture::new(resolve_field::<T>(name, nullable, resolve, ctx))
        })
        .description(description);
        arguments.into_iter().fold(field, |field, (name, ty)| {
            field.argument(InputValue::new(name, TypeRef::from(&ty)))
        })
    }
}

/// Resolves one field. A failure on a nullable field is recorded with the
/// field's path and the field becomes null, so siblings and the enclosing
/// record still resolve. Only non-null fields hand the error to their parent.
async fn resolve_field<'a, T: Entity>(
    field: &'static str,
    nullable: bool,
    resolve: Resolve<T>,
    ctx: ResolverContext<'a>,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    match resolve_value::<T>(field, resolve, &ctx).await {
        Err(err) if nullable => {
            let error = ctx.set_error_path(err.into_server_error(ctx.item.pos));
            ctx.add_error(error);
            Ok(None)
        }
        result => result,
    }
}

async fn resolve_value<'a, T: Entity>(
    field: &'static str,
    resolve: Resolve<T>,
    ctx: &ResolverContext<'a>,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let parent = T::parent(ctx.parent_value).ok_or_else(|| {
        async_graphql::Error::new(format!(
            "{}.{field} resolved on an unexpected value",
            T::TYPE_NAME
        ))
    })?;
    let args = &ctx.args;

    let result = match resolve {
        Resolve::Scalar(project) => return Ok(Some(FieldValue::value(project(parent)))),
        Resolve::Nested(project) => return Ok(project(parent)),
        Resolve::Derive(derive) => derive(parent),
        Resolve::One(presence, fetch) => {
            let repositories = ctx.ctx.data::<Repositories>()?;
            match fetch(repositories, parent, args).await {
                Err(err) if err.is_not_found() && presence == Presence::Optional => {
                    debug!(type_name = T::TYPE_NAME, field, %err, "optional relationship is absent");
                    Ok(None)
                }
                result => result,
            }
        }
        Resolve::Many(fetch) => {
            let repositories = ctx.ctx.data::<Repositories>()?;
            fetch(repositories, parent, args)
                .await
                .map(|nodes| Some(FieldValue::list(nodes)))
        }
    };

    result.map_err(|err| {
        debug!(type_name = T::TYPE_NAME, field, %err, "field resolution failed");
        err.extend()
    })
}

/// Fetches a single related record.
pub(crate) fn one<'a, R>(
    fetch: impl Future<Output = Result<R, RepoError>> + Send + 'a,
) -> BoxFuture<'a, Result<Option<Node>, ResolveError>>
where
    R: Any + Send + Sync,
{
    async move { Ok(Some(FieldValue::owned_any(fetch.await?))) }.boxed()
}

/// Fetches a list of related records.
pub(crate) fn many<'a, R>(
    fetch: impl Future<Output = Result<Vec<R>, RepoError>> + Send + 'a,
) -> BoxFuture<'a, Result<Vec<Node>, ResolveError>>
where
    R: Any + Send + Sync,
{
    async move { Ok(fetch.await?.into_iter().map(FieldValue::owned_any).collect()) }.boxed()
}

/// A relationship that is known to be absent without asking anyone.
pub(crate) fn none<'a>() -> BoxFuture<'a, Result<Option<Node>, ResolveError>> {
    futures::future::ready(Ok(None)).boxed()
}

pub(crate) fn fail<'a, V: Send + 'a>(err: ResolveError) -> BoxFuture<'a, Result<V, ResolveError>> {
    futures::future::ready(Err(err)).boxed()
}

/// Borrows every record of an embedded list.
pub(crate) fn borrowed_list<'a, R: Any + Send + Sync>(records: &'a [R]) -> Option<FieldValue<'a>> {
    Some(FieldValue::list(
        records.iter().map(|record| FieldValue::borrowed_any(record)),
    ))
}

/// Borrows an embedded record, if present.
pub(crate) fn borrowed<'a, R: Any + Send + Sync>(record: &'a Option<R>) -> Option<FieldValue<'a>> {
    record.as_ref().map(|record| FieldValue::borrowed_any(record))
}
