use astra::{CqlClient, Entity, ExecOptions, Fields, Session};
use time::{OffsetDateTime, macros::datetime};
use uuid::Uuid;

#[derive(Entity, Debug, Clone, Default, PartialEq)]
#[cql(table = "users", keyspace = "testing")]
pub struct User {
    #[cql(column = "user_id")]
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub follower_count: i64,
    pub is_active: bool,
    pub last_login: Option<OffsetDateTime>,
    pub tags: Vec<String>,
}

pub fn alice() -> User {
    User {
        id: Uuid::parse_str("a1a1a1a1-a1a1-a1a1-a1a1-a1a1a1a1a1a1").unwrap(),
        name: "Alice".into(),
        email: Some("alice@example.com".into()),
        follower_count: 56,
        is_active: true,
        last_login: Some(datetime!(2025-07-15 09:30:00.250 UTC)),
        tags: vec!["admin".into(), "beta".into()],
    }
}

pub fn bob() -> User {
    User {
        id: Uuid::parse_str("b2b2b2b2-b2b2-b2b2-b2b2-b2b2b2b2b2b2").unwrap(),
        name: "Bob".into(),
        email: None,
        follower_count: 0,
        is_active: false,
        last_login: None,
        tags: vec![],
    }
}

async fn find<S: Session>(client: &CqlClient<S>, id: Uuid) -> Vec<User> {
    let result = client
        .read_entities::<User>(None, &Fields::new().with("user_id", id), None)
        .await;
    assert!(result.is_ok(), "Failed to read users: {:?}", result.as_ref().err());
    result.unwrap()
}

pub async fn users<S: Session>(client: &CqlClient<S>) {
    let alice = alice();
    let bob = bob();

    // Insert
    for user in [&alice, &bob] {
        let result = client.write_entity(None, user, None).await;
        assert!(
            matches!(result, Ok(ref v) if v.success),
            "Failed to write {}: {:?}",
            user.name,
            result
        );
    }

    // Read back
    assert_eq!(find(client, alice.id).await, [alice.clone()]);
    assert_eq!(find(client, bob.id).await, [bob.clone()]);
    assert!(find(client, Uuid::nil()).await.is_empty());

    // A missing email is not written, the stored one survives
    let update = User {
        email: None,
        follower_count: 57,
        ..alice.clone()
    };
    let result = client.write_entity(None, &update, None).await;
    assert!(matches!(result, Ok(ref v) if v.success));
    let found = find(client, alice.id).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].follower_count, 57);
    assert_eq!(found[0].email, alice.email);

    // Conditional insert of an existing row
    let options = ExecOptions {
        if_not_exists: true,
        ..Default::default()
    };
    let result = client
        .write_entity(None, &bob, Some(&options))
        .await
        .expect("Conditional write failed");
    assert!(!result.success, "The row exists, the insert must not apply");

    // Conditional insert of a new row
    let carol = User {
        id: Uuid::new_v4(),
        name: "Carol".into(),
        ..bob.clone()
    };
    let result = client
        .write_entity(None, &carol, Some(&options))
        .await
        .expect("Conditional write failed");
    assert!(result.success);
    assert_eq!(find(client, carol.id).await, [carol]);
}
