/// Builders for common CQL statement text. Values are always left as `?`
/// bind markers so they go through [`Statement::bind`](crate::Statement::bind).
pub struct QueryBuilder;

impl QueryBuilder {
    /// Build a simple SELECT query
    pub fn build_select_query(keyspace: &str, table: &str, columns: &[&str]) -> String {
        format!(
            "SELECT {} FROM {}.{}",
            column_list(columns),
            keyspace,
            table
        )
    }

    /// Build a SELECT restricted by equality on `keys`
    pub fn build_select_where(
        keyspace: &str,
        table: &str,
        columns: &[&str],
        keys: &[&str],
    ) -> String {
        format!(
            "{} WHERE {}",
            Self::build_select_query(keyspace, table, columns),
            equality_list(keys, " AND ")
        )
    }

    /// Build an INSERT query with one marker per column
    pub fn build_insert_query(keyspace: &str, table: &str, columns: &[&str]) -> String {
        let markers = vec!["?"; columns.len()].join(", ");
        format!(
            "INSERT INTO {}.{} ({}) VALUES ({})",
            keyspace,
            table,
            columns.join(", "),
            markers
        )
    }

    /// Build an UPDATE query
    pub fn build_update_query(keyspace: &str, table: &str, set: &[&str], keys: &[&str]) -> String {
        format!(
            "UPDATE {}.{} SET {} WHERE {}",
            keyspace,
            table,
            equality_list(set, ", "),
            equality_list(keys, " AND ")
        )
    }

    /// Build a DELETE query
    pub fn build_delete_query(keyspace: &str, table: &str, keys: &[&str]) -> String {
        format!(
            "DELETE FROM {}.{} WHERE {}",
            keyspace,
            table,
            equality_list(keys, " AND ")
        )
    }

    /// Build a batch statement
    pub fn build_batch_statements(queries: &[String]) -> String {
        let mut batch = String::from("BEGIN BATCH\n");
        for query in queries {
            batch.push_str(&format!("  {};\n", query.trim_end_matches(';')));
        }
        batch.push_str("APPLY BATCH;");
        batch
    }
}

fn column_list(columns: &[&str]) -> String {
    if columns.is_empty() {
        "*".to_string()
    } else {
        columns.join(", ")
    }
}

fn equality_list(columns: &[&str], separator: &str) -> String {
    columns
        .iter()
        .map(|c| format!("{} = ?", c))
        .collect::<Vec<_>>()
        .join(separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::count_bind_markers;

    #[test]
    fn test_build_select_query() {
        assert_eq!(
            QueryBuilder::build_select_query("ks", "users", &[]),
            "SELECT * FROM ks.users"
        );
        assert_eq!(
            QueryBuilder::build_select_where("ks", "users", &["name", "age"], &["id", "org"]),
            "SELECT name, age FROM ks.users WHERE id = ? AND org = ?"
        );
    }

    #[test]
    fn test_build_insert_query() {
        let query = QueryBuilder::build_insert_query("ks", "users", &["id", "name", "age"]);
        assert_eq!(query, "INSERT INTO ks.users (id, name, age) VALUES (?, ?, ?)");
        assert_eq!(count_bind_markers(&query), 3);
    }

    #[test]
    fn test_build_update_and_delete() {
        let update = QueryBuilder::build_update_query("ks", "users", &["name", "age"], &["id"]);
        assert_eq!(update, "UPDATE ks.users SET name = ?, age = ? WHERE id = ?");
        assert_eq!(count_bind_markers(&update), 3);

        let delete = QueryBuilder::build_delete_query("ks", "users", &["id"]);
        assert_eq!(delete, "DELETE FROM ks.users WHERE id = ?");
    }

    #[test]
    fn test_build_batch_statements() {
        let queries = vec![
            QueryBuilder::build_insert_query("ks", "t1", &["id"]),
            "DELETE FROM ks.t2 WHERE id = ?;".to_string(),
        ];

        let batch = QueryBuilder::build_batch_statements(&queries);
        assert!(batch.starts_with("BEGIN BATCH"));
        assert!(batch.ends_with("APPLY BATCH;"));
        assert!(batch.contains("  DELETE FROM ks.t2 WHERE id = ?;\n"));
        assert_eq!(count_bind_markers(&batch), 2);
    }
}
