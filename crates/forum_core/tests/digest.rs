use forum_core::db::open_db_in_memory;
use forum_core::{
    DigestBuilder, DigestError, DigestFrequency, DigestMessage, DigestRepository, MailError,
    Mailer, NewPost, NoopSocialPoster, PostId, PostService, SqliteDigestRepository,
    SqlitePostRepository, SqliteUserRepository, UserId, UserRepository,
};
use rusqlite::{params, Connection};
use std::cell::RefCell;

#[derive(Default)]
struct RecordingMailer {
    sent: RefCell<Vec<(UserId, Vec<PostId>)>>,
    fail: bool,
}

impl Mailer for RecordingMailer {
    fn deliver(&self, message: &DigestMessage<'_>) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::new("smtp unavailable"));
        }
        self.sent.borrow_mut().push((
            message.recipient.id,
            message.posts.iter().map(|post| post.id).collect(),
        ));
        Ok(())
    }
}

fn create_post(conn: &mut Connection, user_id: UserId, title: &str) -> PostId {
    let repo = SqlitePostRepository::try_new(conn).unwrap();
    let mut service = PostService::new(repo, NoopSocialPoster);
    service
        .create_post(NewPost::internal(user_id, title))
        .unwrap()
        .id
}

fn seed_checkpoint(conn: &Connection, frequency: &str, last_post_id: PostId) {
    conn.execute(
        "INSERT INTO digest_histories (frequency, last_post_id) VALUES (?1, ?2);",
        params![frequency, last_post_id],
    )
    .unwrap();
}

type Builder<'conn> =
    DigestBuilder<SqliteDigestRepository<'conn>, SqliteUserRepository<'conn>, RecordingMailer>;

fn daily_builder(conn: &Connection) -> Builder<'_> {
    DigestBuilder::new(
        SqliteDigestRepository::try_new(conn).unwrap(),
        SqliteUserRepository::try_new(conn).unwrap(),
        RecordingMailer::default(),
    )
}

#[test]
fn digest_covers_posts_since_checkpoint_for_subscribers_only() {
    let mut conn = open_db_in_memory().unwrap();
    let daily = {
        let users = SqliteUserRepository::try_new(&conn).unwrap();
        let daily = users
            .create_user("daily@example.com", Some(DigestFrequency::Daily))
            .unwrap();
        users
            .create_user("weekly@example.com", Some(DigestFrequency::Weekly))
            .unwrap();
        users.create_user("quiet@example.com", None).unwrap();
        daily.id
    };
    let old = create_post(&mut conn, daily, "Old news");
    let fresh = create_post(&mut conn, daily, "Fresh");
    seed_checkpoint(&conn, "daily", old);
    seed_checkpoint(&conn, "weekly", 0);

    let builder = daily_builder(&conn);
    let run = builder.send_digest(DigestFrequency::Daily).unwrap();

    assert_eq!(run.window_start.last_post_id, old);
    assert_eq!(run.recipients, 1);
    assert_eq!(run.posts, 1);
    assert!(run.next_checkpoint.id > run.window_start.id);
    assert_eq!(run.next_checkpoint.last_post_id, fresh);
    assert_eq!(*builder.mailer().sent.borrow(), vec![(daily, vec![fresh])]);

    let latest = SqliteDigestRepository::try_new(&conn)
        .unwrap()
        .latest_history(DigestFrequency::Daily)
        .unwrap()
        .unwrap();
    assert_eq!(latest, run.next_checkpoint);

    let weekly_latest = SqliteDigestRepository::try_new(&conn)
        .unwrap()
        .latest_history(DigestFrequency::Weekly)
        .unwrap()
        .unwrap();
    assert_eq!(weekly_latest.last_post_id, 0);
}

#[test]
fn back_to_back_runs_never_resend_a_post() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("daily@example.com", Some(DigestFrequency::Daily))
        .unwrap()
        .id;
    let opening = daily_builder(&conn).send_digest(DigestFrequency::Daily).unwrap();
    assert_eq!(opening.posts, 0);

    let post_id = create_post(&mut conn, user_id, "Same second");

    let builder = daily_builder(&conn);
    let first = builder.send_digest(DigestFrequency::Daily).unwrap();
    let second = builder.send_digest(DigestFrequency::Daily).unwrap();
    assert_eq!((first.posts, second.posts), (1, 0));
    assert_eq!(second.next_checkpoint.last_post_id, post_id);
    assert_eq!(
        *builder.mailer().sent.borrow(),
        vec![(user_id, vec![post_id]), (user_id, Vec::new())]
    );
}

#[test]
fn checkpoints_use_millisecond_timestamps() {
    let conn = open_db_in_memory().unwrap();
    let history = SqliteDigestRepository::try_new(&conn)
        .unwrap()
        .create_history(DigestFrequency::Weekly, 0)
        .unwrap();
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64;
    assert!((now_ms - history.created_at).abs() < 60_000);
}

#[test]
fn first_run_opens_a_checkpoint() {
    let conn = open_db_in_memory().unwrap();
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("daily@example.com", Some(DigestFrequency::Daily))
        .unwrap();

    let digests = SqliteDigestRepository::try_new(&conn).unwrap();
    assert!(digests.latest_history(DigestFrequency::Daily).unwrap().is_none());
    assert_eq!(digests.max_post_id().unwrap(), 0);

    let builder = DigestBuilder::new(
        digests,
        SqliteUserRepository::try_new(&conn).unwrap(),
        RecordingMailer::default(),
    );
    let run = builder.send_digest(DigestFrequency::Daily).unwrap();
    assert_eq!(run.recipients, 1);
    assert_eq!(run.window_start.frequency, DigestFrequency::Daily);
    assert_ne!(run.window_start.id, run.next_checkpoint.id);
    assert_eq!(run.posts, 0);
}

#[test]
fn first_run_skips_posts_that_predate_it() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("daily@example.com", Some(DigestFrequency::Daily))
        .unwrap()
        .id;
    let existing = create_post(&mut conn, user_id, "Before any digest");

    let run = daily_builder(&conn).send_digest(DigestFrequency::Daily).unwrap();
    assert_eq!(run.window_start.last_post_id, existing);
    assert_eq!(run.posts, 0);
}

#[test]
fn failed_delivery_keeps_the_checkpoint() {
    let conn = open_db_in_memory().unwrap();
    SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("daily@example.com", Some(DigestFrequency::Daily))
        .unwrap();
    seed_checkpoint(&conn, "daily", 0);

    let builder = DigestBuilder::new(
        SqliteDigestRepository::try_new(&conn).unwrap(),
        SqliteUserRepository::try_new(&conn).unwrap(),
        RecordingMailer {
            fail: true,
            ..RecordingMailer::default()
        },
    );
    let err = builder.send_digest(DigestFrequency::Daily).unwrap_err();
    assert!(matches!(err, DigestError::Mail(_)));

    let checkpoints: i64 = conn
        .query_row("SELECT COUNT(*) FROM digest_histories;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(checkpoints, 1);
}
