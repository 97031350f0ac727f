#[cfg(test)]
mod tests {
    use astra::{
        BindValue, Consistency, CqlClient, ExecOptions, Fields, MappingError, RequestDefaults,
        RequestProfile, Value, future,
    };
    use astra_tests::{
        Invoice, MemorySession, User, alice, execute_tests, init_logs, invoice, memory_session,
        registry, silent_logs,
    };
    use indoc::indoc;
    use std::{sync::Arc, time::Duration};
    use time::macros::datetime;
    use uuid::Uuid;

    fn client(session: MemorySession) -> CqlClient<MemorySession> {
        CqlClient::new(session, Arc::new(registry()), RequestDefaults::default())
    }

    fn mapping_error(error: &astra::Error) -> &MappingError {
        error
            .downcast_ref::<MappingError>()
            .unwrap_or_else(|| panic!("Not a mapping error: {:#}", error))
    }

    fn user_fields(id: Uuid) -> Fields {
        Fields::new()
            .with("user_id", id)
            .with("name", "Frank")
            .with("email", Value::Text(None))
    }

    #[tokio::test]
    async fn memory() {
        init_logs();
        execute_tests(memory_session()).await;
    }

    #[tokio::test]
    async fn null_fields_are_unset() {
        init_logs();
        let client = client(memory_session());
        let id = Uuid::new_v4();
        let result = client
            .write(None, "users", &user_fields(id), None)
            .await
            .expect("Could not write");
        assert!(result.success);
        assert_eq!(
            client.session().prepared(),
            ["INSERT INTO testing.users (user_id, name, email) VALUES (?, ?, ?)"]
        );
        let statement = client.session().last_executed().unwrap();
        assert_eq!(
            statement.values,
            [
                BindValue::Set(Value::Uuid(Some(id))),
                BindValue::Set(Value::Text(Some("Frank".into()))),
                BindValue::Unset,
            ]
        );
        let rows = client.session().rows("testing", "users");
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].contains_key("email"));
    }

    #[tokio::test]
    async fn statements_are_prepared_once() {
        init_logs();
        let client = client(memory_session());
        for _ in 0..3 {
            let result = client
                .write(None, "users", &user_fields(Uuid::new_v4()), None)
                .await
                .unwrap();
            assert!(result.success);
        }
        assert_eq!(client.session().prepare_count(), 1);
        assert_eq!(client.statements().len().await, 1);
        assert_eq!(client.session().executed().len(), 3);

        // Other columns, other statement
        let fields = Fields::new().with("user_id", Uuid::new_v4());
        client.write(None, "users", &fields, None).await.unwrap();
        assert_eq!(client.session().prepare_count(), 2);

        // Same columns with a TTL, other statement
        let options = ExecOptions {
            ttl_seconds: Some(10),
            ..Default::default()
        };
        client
            .write(None, "users", &fields, Some(&options))
            .await
            .unwrap();
        assert_eq!(client.session().prepare_count(), 3);
        client
            .write(None, "users", &fields, Some(&options))
            .await
            .unwrap();
        assert_eq!(client.session().prepare_count(), 3);
    }

    #[tokio::test]
    async fn concurrent_writes() {
        init_logs();
        let client = client(memory_session());
        let fields: Vec<_> = (0..16).map(|_| user_fields(Uuid::new_v4())).collect();
        let results =
            future::join_all(fields.iter().map(|v| client.write(None, "users", v, None))).await;
        assert!(results.iter().all(|v| matches!(v, Ok(v) if v.success)));
        assert_eq!(client.statements().len().await, 1);
        assert!(client.session().prepare_count() >= 1);
        assert_eq!(client.session().rows("testing", "users").len(), 16);
    }

    #[tokio::test]
    async fn timestamp_and_ttl() {
        init_logs();
        let client = client(memory_session());
        let options = ExecOptions {
            ttl_seconds: Some(3600),
            using_timestamp: Some(datetime!(2025-01-01 00:00 UTC)),
            consistency: Some(Consistency::One),
            ..Default::default()
        };
        let result = client
            .write(None, "users", &user_fields(Uuid::new_v4()), Some(&options))
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            client.session().prepared()[0],
            indoc! {"
                INSERT INTO testing.users (user_id, name, email) VALUES (?, ?, ?) USING TIMESTAMP ? AND TTL ?
            "}
            .trim()
        );
        let statement = client.session().last_executed().unwrap();
        assert_eq!(statement.values.len(), 5);
        assert_eq!(
            statement.values[3],
            BindValue::Set(Value::BigInt(Some(1_735_689_600_000_000)))
        );
        assert_eq!(statement.values[4], BindValue::Set(Value::Int(Some(3600))));
        assert_eq!(statement.options.consistency, Consistency::One);
        assert_eq!(statement.options.ttl_seconds, Some(3600));
    }

    #[tokio::test]
    async fn conditional_write_with_timestamp() {
        init_logs();
        let client = client(memory_session());
        let options = ExecOptions {
            if_not_exists: true,
            using_timestamp: Some(datetime!(2025-01-01 00:00 UTC)),
            ..Default::default()
        };
        let error = client
            .write(None, "users", &user_fields(Uuid::new_v4()), Some(&options))
            .await
            .expect_err("Must not be supported");
        assert!(matches!(mapping_error(&error), MappingError::NotSupported(..)));
        assert_eq!(client.session().prepare_count(), 0);
    }

    #[tokio::test]
    async fn invalid_arguments() {
        init_logs();
        let client = client(memory_session());
        let error = client
            .write(None, "users", &Fields::new(), None)
            .await
            .expect_err("No fields");
        assert!(matches!(mapping_error(&error), MappingError::InvalidArgument(..)));

        let error = client
            .write(None, " ", &user_fields(Uuid::new_v4()), None)
            .await
            .expect_err("No table");
        assert!(matches!(mapping_error(&error), MappingError::InvalidArgument(..)));

        let filters = Fields::new().with("user_id", Value::Uuid(None));
        let error = client
            .read_entities::<User>(None, &filters, None)
            .await
            .expect_err("Null filter");
        assert!(matches!(mapping_error(&error), MappingError::InvalidArgument(..)));
        assert!(format!("{:#}", error).contains("user_id"));
        assert_eq!(client.session().prepare_count(), 0);
    }

    #[tokio::test]
    async fn keyspace_resolution() {
        init_logs();
        // No keyspace anywhere
        let client = client(MemorySession::new().with_primary_key("users", ["user_id"]));
        let error = client
            .write(None, "users", &user_fields(Uuid::new_v4()), None)
            .await
            .expect_err("No keyspace");
        assert!(matches!(mapping_error(&error), MappingError::InvalidArgument(..)));

        // Declared on the type
        let result = client.write_entity(None, &alice(), None).await.unwrap();
        assert!(result.success);
        assert_eq!(client.session().rows("testing", "users").len(), 1);

        // Explicit wins
        let result = client
            .write_entity(Some("other"), &alice(), None)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(client.session().rows("other", "users").len(), 1);

        // Configured by convention
        let invoice = invoice();
        client.write_entity(None, &invoice, None).await.unwrap();
        assert_eq!(client.session().rows("billing", "invoice").len(), 1);
        let read = client
            .read_entities::<Invoice>(
                None,
                &Fields::new().with("invoice_id", invoice.invoice_id),
                None,
            )
            .await
            .unwrap();
        assert_eq!(read, [invoice]);
    }

    #[tokio::test]
    async fn store_failures() {
        init_logs();
        let client = client(memory_session());
        silent_logs! {
            client.session().fail_execute(true);
            let result = client
                .write(None, "users", &user_fields(Uuid::new_v4()), None)
                .await
                .expect("Store failures are not errors");
            assert!(!result.success);
            let users = client
                .read_entities::<User>(None, &Fields::new().with("user_id", Uuid::nil()), None)
                .await
                .expect("Store failures are not errors");
            assert!(users.is_empty());
            client.session().fail_execute(false);

            client.session().fail_prepare(true);
            let result = client
                .write(None, "users", &Fields::new().with("user_id", Uuid::nil()), None)
                .await
                .unwrap();
            assert!(!result.success);
            client.session().fail_prepare(false);
        }
        // The failed prepare was not cached
        let result = client
            .write(None, "users", &Fields::new().with("user_id", Uuid::nil()), None)
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn request_defaults() {
        init_logs();
        let defaults = RequestDefaults {
            read: RequestProfile {
                consistency: Some(Consistency::LocalOne),
                page_size: Some(20),
                ..Default::default()
            },
            write: RequestProfile {
                consistency: Some(Consistency::Quorum),
                timeout: Some(Duration::from_secs(2)),
                ..Default::default()
            },
        };
        let client = CqlClient::new(memory_session(), Arc::new(registry()), defaults);
        client.write_entity(None, &alice(), None).await.unwrap();
        let statement = client.session().last_executed().unwrap();
        assert_eq!(statement.options.consistency, Consistency::Quorum);
        assert_eq!(statement.options.timeout, Duration::from_secs(2));
        assert_eq!(statement.options.page_size, 5000);

        client
            .read_entities::<User>(None, &Fields::new().with("user_id", alice().id), None)
            .await
            .unwrap();
        let statement = client.session().last_executed().unwrap();
        assert_eq!(statement.options.consistency, Consistency::LocalOne);
        assert_eq!(statement.options.page_size, 20);
        assert_eq!(statement.options.timeout, Duration::from_secs(12));
    }

    #[tokio::test]
    async fn documents() {
        init_logs();
        struct Visit {
            user: Uuid,
            page: &'static str,
        }
        let client = client(memory_session().with_primary_key("visits", ["user_id"]));
        let visit = Visit {
            user: Uuid::new_v4(),
            page: "/home",
        };
        let result = client
            .write_with(
                Some("analytics"),
                "visits",
                &visit,
                |v| Fields::new().with("user_id", v.user).with("page", v.page),
                None,
            )
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(
            client.session().prepared(),
            ["INSERT INTO analytics.visits (user_id, page) VALUES (?, ?)"]
        );

        #[derive(astra::Entity, Default, Debug, PartialEq)]
        struct PageVisit {
            pub user_id: Uuid,
            pub page: String,
            pub referrer: Option<String>,
        }
        let visits: Vec<PageVisit> = client
            .read(
                Some("analytics"),
                "visits",
                &Fields::new().with("user_id", visit.user),
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            visits,
            [PageVisit {
                user_id: visit.user,
                page: "/home".into(),
                referrer: None,
            }]
        );
        assert_eq!(
            client.session().prepared()[1],
            "SELECT page, referrer, user_id FROM analytics.visits WHERE user_id = ?"
        );
    }

    #[tokio::test]
    async fn row_mapping() {
        init_logs();
        let client = client(memory_session());
        let fields = client.map_to_fields(&alice()).unwrap();
        let user: User = client.map_from_row(&fields.to_row()).unwrap();
        assert_eq!(user, alice());
    }

    #[tokio::test]
    async fn separators_in_names() {
        init_logs();
        let client = client(
            MemorySession::new()
                .with_primary_key("t", ["id"])
                .with_primary_key("s|t", ["id"]),
        );
        let result = client
            .write(Some("k|s"), "t", &Fields::new().with("id", 1), None)
            .await
            .unwrap();
        assert!(result.success);
        let result = client
            .write(Some("k"), "s|t", &Fields::new().with("id", 2), None)
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(client.session().prepare_count(), 2);
        assert_eq!(client.session().rows("k|s", "t").len(), 1);
        assert_eq!(client.session().rows("k", "s|t").len(), 1);

        let fields = Fields::new().with("id", 3).with("a,b", "x");
        let result = client.write(Some("k"), "t", &fields, None).await.unwrap();
        assert!(result.success);
        let fields = Fields::new()
            .with("id", 4)
            .with("a", "x")
            .with("b", "y");
        let result = client.write(Some("k"), "t", &fields, None).await.unwrap();
        assert!(result.success);
        assert_eq!(client.session().prepare_count(), 4);
        let rows = client.session().rows("k", "t");
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains_key("a,b"));
        assert!(rows[1].contains_key("b"));
    }
}
