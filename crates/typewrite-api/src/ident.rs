use md5::{Digest, Md5};
use uuid::Uuid;

/// Generates the (uuid, id) pair for a new entity. The table id is the hex
/// md5 of the uuid, which keeps keys short and opaque.
pub fn new_entity_id() -> (String, String) {
    let uuid = Uuid::new_v4().to_string();
    let id = short_id(&uuid);
    (uuid, id)
}

pub fn short_id(uuid: &str) -> String {
    hex::encode(Md5::digest(uuid.as_bytes()))
}

/// URL-friendly slug derived from a title: lowercase alphanumerics with
/// single dashes between words.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_id_is_md5_hex() {
        let id = short_id("9073926b-929f-31c2-abc9-fad77ae3e8eb");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        // Stable for a fixed uuid
        assert_eq!(id, short_id("9073926b-929f-31c2-abc9-fad77ae3e8eb"));
    }

    #[test]
    fn ids_are_unique_per_call() {
        let (uuid_a, id_a) = new_entity_id();
        let (uuid_b, id_b) = new_entity_id();
        assert_ne!(uuid_a, uuid_b);
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Rust   &   SQLite  "), "rust-sqlite");
        assert_eq!(slugify("Öland 2024"), "öland-2024");
        assert_eq!(slugify("---"), "");
    }
}
