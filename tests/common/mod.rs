//! Shared fixtures: a small social domain

use samyama_ogm::{DomainMetadata, Entity, EntityRef, MappingContext, TypeDeclaration};
use std::sync::Arc;

/// Route `tracing` output through the test harness; safe to call repeatedly
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn social_metadata() -> Arc<DomainMetadata> {
    let metadata = DomainMetadata::builder()
        .declare(TypeDeclaration::interface("Named"))
        .declare(TypeDeclaration::node("Person").extends("Named").primary_index("email"))
        .declare(TypeDeclaration::node("Employee").extends("Person"))
        .declare(TypeDeclaration::node("Company").extends("Named"))
        .declare(TypeDeclaration::relationship("Knows", "start", "end"))
        .declare(TypeDeclaration::relationship("WorksAt", "employee", "company"))
        .build()
        .expect("social domain is valid");
    Arc::new(metadata)
}

pub fn context() -> MappingContext {
    MappingContext::new(social_metadata())
}

pub fn person(id: i64) -> EntityRef {
    Entity::new("Person")
        .with_id(id)
        .with_label("Person")
        .with_property("email", format!("person{}@example.com", id))
        .into_ref()
}

pub fn knows(id: i64, start: &EntityRef, end: &EntityRef) -> EntityRef {
    Entity::new("Knows")
        .with_id(id)
        .with_reference("start", start)
        .with_reference("end", end)
        .into_ref()
}
