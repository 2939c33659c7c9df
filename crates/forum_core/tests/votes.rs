use forum_core::db::open_db_in_memory;
use forum_core::{
    NewPost, NoopSocialPoster, PostService, PostServiceError, RepoError, SqlitePostRepository,
    SqliteUserRepository, SqliteVoteRepository, UserRepository, VoteRepository,
};

#[test]
fn add_vote_is_idempotent_per_user() {
    let mut conn = open_db_in_memory().unwrap();
    let (voter, other) = {
        let users = SqliteUserRepository::try_new(&conn).unwrap();
        (
            users.create_user("voter@example.com", None).unwrap().id,
            users.create_user("other@example.com", None).unwrap().id,
        )
    };
    let post_id = {
        let repo = SqlitePostRepository::try_new(&mut conn).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        let post = service
            .create_post(NewPost::internal(voter, "Vote on me"))
            .unwrap();

        assert!(!service.has_voted(post.id, voter).unwrap());
        service.add_vote(post.id, voter).unwrap();
        service.add_vote(post.id, voter).unwrap();
        assert!(service.has_voted(post.id, voter).unwrap());
        assert!(!service.has_voted(post.id, other).unwrap());
        assert_eq!(service.count_votes(post.id).unwrap(), 1);

        service.add_vote(post.id, other).unwrap();
        assert_eq!(service.count_votes(post.id).unwrap(), 2);
        post.id
    };

    let votes = SqliteVoteRepository::try_new(&conn)
        .unwrap()
        .list_votes(post_id)
        .unwrap();
    let voters: Vec<_> = votes.iter().map(|vote| vote.user_id).collect();
    assert_eq!(voters, vec![voter, other]);
}

#[test]
fn votes_from_two_connections_collapse_to_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forum.db");
    let mut conn_a = forum_core::db::open_db(&path).unwrap();
    let conn_b = forum_core::db::open_db(&path).unwrap();

    let user_id = SqliteUserRepository::try_new(&conn_a)
        .unwrap()
        .create_user("voter@example.com", None)
        .unwrap()
        .id;
    let post_id = {
        let repo = SqlitePostRepository::try_new(&mut conn_a).unwrap();
        let mut service = PostService::new(repo, NoopSocialPoster);
        service
            .create_post(NewPost::internal(user_id, "Contested"))
            .unwrap()
            .id
    };

    let votes_a = SqliteVoteRepository::try_new(&conn_a).unwrap();
    let votes_b = SqliteVoteRepository::try_new(&conn_b).unwrap();
    votes_a.add_vote(post_id, user_id).unwrap();
    votes_b.add_vote(post_id, user_id).unwrap();

    assert_eq!(votes_a.count_votes(post_id).unwrap(), 1);
    assert!(votes_b.has_voted(post_id, user_id).unwrap());
}

#[test]
fn voting_on_missing_post_or_user_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let user_id = SqliteUserRepository::try_new(&conn)
        .unwrap()
        .create_user("voter@example.com", None)
        .unwrap()
        .id;
    let repo = SqlitePostRepository::try_new(&mut conn).unwrap();
    let mut service = PostService::new(repo, NoopSocialPoster);
    let post = service
        .create_post(NewPost::internal(user_id, "Real"))
        .unwrap();

    assert!(matches!(
        service.add_vote(404, user_id).unwrap_err(),
        PostServiceError::PostNotFound(404)
    ));
    assert!(matches!(
        service.add_vote(post.id, 404).unwrap_err(),
        PostServiceError::Repo(RepoError::UserNotFound(404))
    ));
}
