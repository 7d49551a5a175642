//! Reserved column names and naming helpers

/// Default name of the geometry column attached to a [`crate::SpatialTable`].
pub const GEOMETRY_COLUMN: &str = "geometry";

/// Check whether a candidate geometry column name is usable given the
/// existing attribute column names.
pub fn is_free(columns: &[String], candidate: &str) -> bool {
    !columns.iter().any(|c| c == candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_free() {
        let cols = vec!["id".to_string(), "name".to_string()];
        assert!(is_free(&cols, GEOMETRY_COLUMN));
        assert!(!is_free(&cols, "name"));
    }
}
