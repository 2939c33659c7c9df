use forum_core::db::open_db_in_memory;
use forum_core::{
    search_posts, NewPost, NoopSocialPoster, PostId, PostKind, PostSearchQuery, PostService,
    SqlitePostRepository, SqliteUserRepository, UserRepository,
};
use rusqlite::Connection;

struct Fixture {
    conn: Connection,
    rails_title: PostId,
    ruby_title: PostId,
    tagged: PostId,
    commented: PostId,
    body: PostId,
}

fn fixture() -> Fixture {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("author@example.com", None)
        .unwrap()
        .id;

    let (rails_title, ruby_title, tagged, commented, body) = {
        let repo = SqlitePostRepository::try_new(&mut conn).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        let rails_title = service
            .create_post(NewPost::internal(user_id, "Rails is good"))
            .unwrap()
            .id;
        let ruby_title = service
            .create_post(NewPost::internal(user_id, "Ruby is good"))
            .unwrap()
            .id;
        let tagged = service
            .create_post(NewPost::internal(user_id, "Untitled one").with_tags("elixir, phoenix"))
            .unwrap()
            .id;
        let commented = service
            .create_post(NewPost::internal(user_id, "Untitled two"))
            .unwrap()
            .id;
        service
            .add_comment(commented, user_id, "Have you tried Haskell?")
            .unwrap();
        let body = service
            .create_post(
                NewPost::external(user_id, "Untitled three", "https://example.com")
                    .with_body("A long read about *Clojure* macros"),
            )
            .unwrap()
            .id;
        (rails_title, ruby_title, tagged, commented, body)
    };

    Fixture {
        conn,
        rails_title,
        ruby_title,
        tagged,
        commented,
        body,
    }
}

fn ids(conn: &Connection, text: &str) -> Vec<PostId> {
    search_posts(conn, &PostSearchQuery::new(text))
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect()
}

#[test]
fn title_match_is_case_insensitive() {
    let f = fixture();
    assert_eq!(ids(&f.conn, "rails"), vec![f.rails_title]);
    assert_eq!(ids(&f.conn, "RUBY"), vec![f.ruby_title]);
}

#[test]
fn tag_comment_and_body_matches_return_only_their_post() {
    let f = fixture();
    assert_eq!(ids(&f.conn, "phoenix"), vec![f.tagged]);
    assert_eq!(ids(&f.conn, "haskell"), vec![f.commented]);
    assert_eq!(ids(&f.conn, "clojure"), vec![f.body]);
}

#[test]
fn post_matching_several_fields_appears_once() {
    let mut f = fixture();
    {
        let repo = SqlitePostRepository::try_new(&mut f.conn).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        service.set_tags_string(f.rails_title, "rails").unwrap();
        service.add_comment(f.rails_title, 1, "rails rocks").unwrap();
        service.add_comment(f.rails_title, 1, "more rails").unwrap();
    }
    assert_eq!(ids(&f.conn, "rails"), vec![f.rails_title]);
}

#[test]
fn shared_substring_returns_posts_in_id_order() {
    let f = fixture();
    assert_eq!(ids(&f.conn, "is good"), vec![f.rails_title, f.ruby_title]);
    assert_eq!(ids(&f.conn, "untitled"), vec![f.tagged, f.commented, f.body]);
}

#[test]
fn like_wildcards_are_plain_characters() {
    let f = fixture();
    assert!(ids(&f.conn, "%").is_empty());
    assert!(ids(&f.conn, "_").is_empty());
}

#[test]
fn blank_and_unmatched_queries_return_nothing() {
    let f = fixture();
    assert!(ids(&f.conn, "").is_empty());
    assert!(ids(&f.conn, "   ").is_empty());
    assert!(ids(&f.conn, "cobol").is_empty());
}

#[test]
fn kind_filter_and_limit_apply() {
    let f = fixture();
    let mut query = PostSearchQuery::new("untitled");
    query.kind = Some(PostKind::External);
    let external: Vec<_> = search_posts(&f.conn, &query)
        .unwrap()
        .into_iter()
        .map(|post| post.id)
        .collect();
    assert_eq!(external, vec![f.body]);

    let mut limited = PostSearchQuery::new("untitled");
    limited.limit = Some(2);
    assert_eq!(search_posts(&f.conn, &limited).unwrap().len(), 2);
}

#[test]
fn non_ascii_text_is_matched_case_insensitively() {
    let mut f = fixture();
    let (uber, accent_tag) = {
        let repo = SqlitePostRepository::try_new(&mut f.conn).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        let uber = service
            .create_post(NewPost::internal(1, "Über Rails"))
            .unwrap()
            .id;
        let accent_tag = service
            .create_post(NewPost::internal(1, "Untitled four").with_tags("Ça-Va"))
            .unwrap()
            .id;
        (uber, accent_tag)
    };
    assert_eq!(ids(&f.conn, "über"), vec![uber]);
    assert_eq!(ids(&f.conn, "ÜBER"), vec![uber]);
    assert_eq!(ids(&f.conn, "ÇA-VA"), vec![accent_tag]);
}

#[test]
fn query_is_matched_without_trimming() {
    let mut f = fixture();
    let goodness = {
        let repo = SqlitePostRepository::try_new(&mut f.conn).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        service
            .create_post(NewPost::internal(1, "Goodness gracious"))
            .unwrap()
            .id
    };
    assert_eq!(ids(&f.conn, "good"), vec![f.rails_title, f.ruby_title, goodness]);
    assert_eq!(ids(&f.conn, " good"), vec![f.rails_title, f.ruby_title]);
}
