#[cfg(test)]
mod tests {
    use astra::{CqlWriter, GenericCqlWriter, build_cache_key, build_insert};
    use std::collections::HashSet;
    use time::macros::datetime;

    const WRITER: GenericCqlWriter = GenericCqlWriter {};

    #[test]
    fn plain_insert() {
        assert_eq!(
            build_insert("ks", "users", &["id", "name"], false, None, None),
            "INSERT INTO ks.users (id, name) VALUES (?, ?)"
        );
        assert_eq!(
            build_insert("ks", "t", &["a"], false, Some(0), None),
            "INSERT INTO ks.t (a) VALUES (?)",
            "A zero TTL is not written"
        );
        assert_eq!(
            build_insert("ks", "t", &["a"], false, Some(-5), None),
            "INSERT INTO ks.t (a) VALUES (?)"
        );
    }

    #[test]
    fn using_clause() {
        let at = Some(datetime!(2025-01-01 00:00 UTC));
        assert_eq!(
            build_insert("ks", "t", &["a", "b"], false, Some(3600), None),
            "INSERT INTO ks.t (a, b) VALUES (?, ?) USING TTL ?"
        );
        assert_eq!(
            build_insert("ks", "t", &["a", "b"], false, None, at),
            "INSERT INTO ks.t (a, b) VALUES (?, ?) USING TIMESTAMP ?"
        );
        assert_eq!(
            build_insert("ks", "t", &["a", "b"], false, Some(60), at),
            "INSERT INTO ks.t (a, b) VALUES (?, ?) USING TIMESTAMP ? AND TTL ?"
        );
        assert_eq!(
            build_insert("ks", "t", &["a"], true, Some(60), None),
            "INSERT INTO ks.t (a) VALUES (?) USING TTL ? IF NOT EXISTS"
        );
        assert_eq!(
            build_insert("ks", "t", &["a"], true, None, None),
            "INSERT INTO ks.t (a) VALUES (?) IF NOT EXISTS"
        );
    }

    #[test]
    fn quoted_identifiers() {
        assert_eq!(
            build_insert("Shop", "order items", &["itemId", r#"say "hi""#, "qty_2"], false, None, None),
            r#"INSERT INTO Shop."order items" (itemId, "say ""hi""", qty_2) VALUES (?, ?, ?)"#
        );
        let mut out = String::new();
        WRITER.write_identifier(&mut out, "é");
        assert_eq!(out, r#""é""#);
    }

    #[test]
    fn select() {
        let mut out = String::new();
        WRITER.write_select(&mut out, "ks", "users", &["id", "name"], &["id"]);
        assert_eq!(out, "SELECT id, name FROM ks.users WHERE id = ?");

        out.clear();
        WRITER.write_select(&mut out, "ks", "users", &[], &[]);
        assert_eq!(out, "SELECT * FROM ks.users");

        out.clear();
        WRITER.write_select(&mut out, "ks", "users", &["id"], &["a", "Mixed Case"]);
        assert_eq!(
            out,
            r#"SELECT id FROM ks.users WHERE a = ? AND "Mixed Case" = ?"#
        );
    }

    #[test]
    fn cache_keys() {
        let at = Some(datetime!(2025-01-01 00:00 UTC));
        let columns = ["id", "name"];
        let mut keys = HashSet::new();
        for if_not_exists in [false, true] {
            for ttl in [None, Some(30)] {
                for timestamp in [None, at] {
                    keys.insert(build_cache_key("ks", "users", &columns, if_not_exists, ttl, timestamp));
                }
            }
        }
        assert_eq!(keys.len(), 8);
        assert!(keys.contains("ks|users|id,name|NOIF|NOTS|NOTTL"));
        assert!(keys.contains("ks|users|id,name|IFNE|TS|TTL"));

        // Only the presence of a timestamp or a positive TTL matters
        assert_eq!(
            build_cache_key("ks", "users", &columns, false, Some(30), None),
            build_cache_key("ks", "users", &columns, false, Some(7200), None),
        );
        assert_eq!(
            build_cache_key("ks", "users", &columns, false, Some(0), None),
            build_cache_key("ks", "users", &columns, false, None, None),
        );
        assert_ne!(
            build_cache_key("ks", "users", &["id"], false, None, None),
            build_cache_key("ks", "users", &columns, false, None, None),
        );
        assert_ne!(
            WRITER.select_cache_key("ks", "users", &columns, &[]),
            build_cache_key("ks", "users", &columns, false, None, None),
        );
    }

    #[test]
    fn cache_keys_separate_quoted_names() {
        assert_ne!(
            build_cache_key("ks", "t", &["a,b"], false, None, None),
            build_cache_key("ks", "t", &["a", "b"], false, None, None),
        );
        assert_eq!(
            build_cache_key("ks", "t", &["a,b"], false, None, None),
            r#"ks|t|"a,b"|NOIF|NOTS|NOTTL"#
        );
        assert_ne!(
            build_cache_key("k|s", "t", &["id"], false, None, None),
            build_cache_key("k", "s|t", &["id"], false, None, None),
        );
        assert_ne!(
            build_cache_key("ks", "t", &[r#"a"|"b"#], false, None, None),
            build_cache_key("ks", "t", &["a", "b"], false, None, None),
        );
        assert_ne!(
            build_cache_key("ks", "t", &[""], false, None, None),
            build_cache_key("ks", "t", &[], false, None, None),
        );
        assert_ne!(
            WRITER.select_cache_key("ks", "t", &["a,b"], &["id"]),
            WRITER.select_cache_key("ks", "t", &["a", "b"], &["id"]),
        );
        assert_ne!(
            WRITER.select_cache_key("ks", "t", &["a"], &["b|c"]),
            WRITER.select_cache_key("ks", "t", &["a|b"], &["c"]),
        );
        assert_ne!(
            WRITER.select_cache_key("k|s", "t", &[], &["id"]),
            WRITER.select_cache_key("k", "s|t", &[], &["id"]),
        );
    }
}
