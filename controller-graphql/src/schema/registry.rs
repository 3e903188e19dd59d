//! Accumulates every type of the schema and checks the result is closed
//! before handing it to the execution engine.

use async_graphql::dynamic::Enum;
use async_graphql::dynamic::EnumItem;
use async_graphql::dynamic::Scalar;
use async_graphql::dynamic::Schema;
use async_graphql::dynamic::Type;
use indexmap::IndexMap;

use super::Entity;
use super::FieldType;
use super::Fields;
use crate::error::RegistryError;
use crate::event::EventType;

struct FieldShape {
    name: &'static str,
    ty: FieldType,
    arguments: Vec<FieldType>,
}

#[derive(Default)]
pub(crate) struct Registry {
    types: Vec<Type>,
    /// Every registered type name, with its fields for objects and interfaces.
    shapes: IndexMap<String, Vec<FieldShape>>,
    /// Event object name to the type of its `data` field.
    event_objects: IndexMap<String, String>,
    conflicts: Vec<RegistryError>,
}

impl Registry {
    pub(crate) fn scalar(&mut self, name: &str, description: &str) -> &mut Self {
        self.shapes.insert(name.to_string(), Vec::new());
        self.types
            .push(Scalar::new(name).description(description).into());
        self
    }

    pub(crate) fn enumeration(
        &mut self,
        name: &str,
        description: &str,
        items: impl IntoIterator<Item = EnumItem>,
    ) -> &mut Self {
        self.shapes.insert(name.to_string(), Vec::new());
        let ty = items
            .into_iter()
            .fold(Enum::new(name).description(description), Enum::item);
        self.types.push(ty.into());
        self
    }

    pub(crate) fn entity<T: Entity>(&mut self) -> &mut Self {
        self.object(T::TYPE_NAME, T::fields(), &[])
    }

    pub(crate) fn object<T: Entity>(
        &mut self,
        name: &str,
        fields: Fields<T>,
        interfaces: &[&str],
    ) -> &mut Self {
        self.shapes.insert(name.to_string(), shapes(&fields));
        let object = interfaces
            .iter()
            .fold(fields.into_object(name), |object, interface| {
                object.implement(*interface)
            });
        self.types.push(object.into());
        self
    }

    pub(crate) fn interface<T: Entity>(&mut self, name: &str, fields: &Fields<T>) -> &mut Self {
        self.shapes.insert(name.to_string(), shapes(fields));
        self.types.push(fields.to_interface(name).into());
        self
    }

    /// Records which payload type an event object exposes as `data`.
    pub(crate) fn map_event_object(&mut self, object: &str, data_type: &str) -> &mut Self {
        match self.event_objects.get(object) {
            Some(first) if first != data_type => {
                self.conflicts.push(RegistryError::ConflictingPayload {
                    object: object.to_string(),
                    first: first.clone(),
                    second: data_type.to_string(),
                });
            }
            Some(_) => {}
            None => {
                self.event_objects
                    .insert(object.to_string(), data_type.to_string());
            }
        }
        self
    }

    pub(crate) fn validate(&self) -> Result<(), RegistryError> {
        if let Some(conflict) = self.conflicts.first() {
            return Err(conflict.clone());
        }

        for event_type in EventType::ALL {
            let object = event_type.object_type_name();
            let data_type = self
                .event_objects
                .get(object)
                .filter(|_| self.shapes.contains_key(object))
                .ok_or_else(|| RegistryError::MissingEventObject(event_type.to_string()))?;
            if data_type != event_type.data_type_name() {
                return Err(RegistryError::ConflictingPayload {
                    object: object.to_string(),
                    first: data_type.clone(),
                    second: event_type.data_type_name().to_string(),
                });
            }
        }

        for (type_name, fields) in &self.shapes {
            for field in fields {
                let referenced = std::iter::once(&field.ty)
                    .chain(&field.arguments)
                    .filter_map(FieldType::inner_type_name);
                for name in referenced {
                    if !self.shapes.contains_key(name) {
                        return Err(RegistryError::UnknownType {
                            type_name: name.to_string(),
                            referenced_by: format!("{type_name}.{}", field.name),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Validates the registered types and builds the executable schema.
    pub(crate) fn finish(self, query: &str, mutation: &str) -> Result<Schema, RegistryError> {
        self.validate()?;
        self.types
            .into_iter()
            .fold(Schema::build(query, Some(mutation), None), |schema, ty| {
                schema.register(ty)
            })
            .finish()
            .map_err(|err| RegistryError::Schema(err.to_string()))
    }
}

fn shapes<T: Entity>(fields: &Fields<T>) -> Vec<FieldShape> {
    fields
        .specs()
        .iter()
        .map(|spec| FieldShape {
            name: spec.name,
            ty: spec.ty.clone(),
            arguments: spec.arguments.iter().map(|(_, ty)| ty.clone()).collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use async_graphql::Value;

    use super::*;
    use crate::schema::register_all;

    struct Orphan;

    impl Entity for Orphan {
        const TYPE_NAME: &'static str = "Orphan";

        fn fields() -> Fields<Self> {
            Fields::<Self>::new().scalar(
                "parent",
                FieldType::named("Missing"),
                "Never registered",
                |_| Value::Null,
            )
        }
    }

    #[test]
    fn the_full_registry_is_closed() {
        let mut registry = Registry::default();
        register_all(&mut registry);
        assert_eq!(registry.validate(), Ok(()));
    }

    #[test]
    fn every_discriminator_needs_an_event_object() {
        let mut registry = Registry::default();
        crate::schema::scalars::register(&mut registry);
        assert_eq!(
            registry.validate(),
            Err(RegistryError::MissingEventObject("app".into()))
        );
    }

    #[test]
    fn event_objects_cannot_expose_two_payloads() {
        let mut registry = Registry::default();
        register_all(&mut registry);
        registry.map_event_object("EventRoute", "Resource");
        assert_eq!(
            registry.validate(),
            Err(RegistryError::ConflictingPayload {
                object: "EventRoute".into(),
                first: "Route".into(),
                second: "Resource".into(),
            })
        );
    }

    #[test]
    fn referenced_types_must_be_registered() {
        let mut registry = Registry::default();
        register_all(&mut registry);
        registry.entity::<Orphan>();
        assert_eq!(
            registry.validate(),
            Err(RegistryError::UnknownType {
                type_name: "Missing".into(),
                referenced_by: "Orphan.parent".into(),
            })
        );
        assert!(registry.finish("Query", "Mutation").is_err());
    }
}
