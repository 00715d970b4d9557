//! MongoDB query documents.
use bson::{doc, Bson, Document};
use uuid::Uuid;

#[inline]
pub fn uuid(id: Uuid) -> Bson {
    Bson::from(bson::Uuid::from_uuid_1(id))
}

#[inline]
pub fn by_id(id: Uuid) -> Document {
    by_uuid("_id", id)
}

#[inline]
pub fn by_uuid(field: &str, id: Uuid) -> Document {
    let mut filter = Document::new();
    filter.insert(field, uuid(id));
    filter
}

#[inline]
pub fn uuid_in(ids: &[Uuid]) -> Document {
    let ids: Vec<Bson> = ids.iter().copied().map(uuid).collect();
    doc! { "$in": ids }
}

#[inline]
pub fn by_email(email: impl Into<String>) -> Document {
    doc! { "email": email.into() }
}
