//! Object key layout.
//!
//! A document lives at `{collection}/{id}`, with the ID in its canonical
//! hyphenated form. Changing a document's collection therefore moves it to a new
//! key.

use object_store::path::Path;

use nexdb_core::document::Document;

/// Returns the object key `document` is stored under.
pub fn object_key(document: &Document) -> Path {
    Path::from(format!("{}/{}", document.collection(), document.id()))
}
