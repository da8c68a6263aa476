//! Layer merging.

use std::collections::BTreeSet;

/// Deep-merge `overlay` into `base`, recording the dotted path of every
/// leaf the overlay sets.
///
/// Tables merge per key. Scalars and arrays from the overlay replace the
/// base value.
pub fn deep_merge(
    base: &mut toml::Value,
    overlay: &toml::Value,
    prefix: &str,
    set: &mut BTreeSet<String>,
) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                match base_table.get_mut(key) {
                    Some(base_val) => deep_merge(base_val, overlay_val, &path, set),
                    None => {
                        base_table.insert(key.clone(), overlay_val.clone());
                        set.insert(path);
                    },
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            set.insert(prefix.to_owned());
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> toml::Value {
        toml::from_str(s).unwrap()
    }

    #[test]
    fn tables_merge_and_arrays_replace() {
        let mut base = parse("[plugins]\npaths = [\"a\", \"b\"]\nstrict = false\n[logging]\nlevel = \"info\"\n");
        let overlay = parse("[plugins]\npaths = [\"c\"]\n");
        let mut set = BTreeSet::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        let paths = base["plugins"]["paths"].as_array().unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].as_str(), Some("c"));
        assert_eq!(base["plugins"]["strict"].as_bool(), Some(false));
        assert_eq!(base["logging"]["level"].as_str(), Some("info"));
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec!["plugins.paths".to_owned()]);
    }

    #[test]
    fn new_keys_are_added() {
        let mut base = parse("[logging]\nlevel = \"info\"\n");
        let overlay = parse("[logging]\ndirectives = [\"x=debug\"]\n");
        let mut set = BTreeSet::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        assert_eq!(base["logging"]["level"].as_str(), Some("info"));
        assert!(set.contains("logging.directives"));
    }
}
