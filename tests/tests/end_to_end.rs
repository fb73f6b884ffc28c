use pagetalk_client::{
    api::{Comment, CommentId, Error as ApiError, UserId, UserInfo},
    CommentNode, CommentStore, Error, SortOrder,
};
use pagetalk_mock_server::MockListServer;

const PAGE: &str = "/sites/intranet/SitePages/news.aspx";

fn user(id: i64, name: &str) -> UserInfo {
    UserInfo {
        id: UserId(id),
        display_name: String::from(name),
        email: format!("{}@example.com", name.to_lowercase()),
        avatar_url: format!("/userphoto.aspx?size=S&username={name}"),
    }
}

fn store() -> CommentStore<MockListServer> {
    CommentStore::new(MockListServer::new())
}

#[tokio::test]
async fn a_page_without_a_bucket_reads_as_empty() {
    let mut store = store();
    let alice = user(7, "Alice");
    assert_eq!(store.fetch_comments(PAGE, &alice).await.unwrap(), vec![]);
    assert_eq!(store.store_mut().test_num_buckets(), 0);
}

#[tokio::test]
async fn first_post_creates_the_bucket_lazily() {
    let mut store = store();
    let alice = user(7, "Alice");
    let c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();

    assert_eq!(store.store_mut().test_num_buckets(), 1);
    assert_eq!(store.store_mut().test_title(PAGE), Some("news.aspx"));

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, c1.id);
    assert_eq!(all[0].content, "hi");
    assert_eq!(all[0].upvote_count, 0);
    assert!(!all[0].user_has_upvoted);
}

#[tokio::test]
async fn posting_to_an_existing_bucket_appends() {
    let mut store = store();
    let alice = user(7, "Alice");
    store
        .post(PAGE, Comment::now(&alice, None, String::from("first")))
        .await
        .unwrap();
    store
        .post(PAGE, Comment::now(&alice, None, String::from("second")))
        .await
        .unwrap();

    assert_eq!(store.store_mut().test_num_buckets(), 1);
    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    let contents: Vec<&str> = all.iter().map(|c| &c.content as &str).collect();
    assert_eq!(contents, ["first", "second"]);
}

#[tokio::test]
async fn deleting_a_comment_removes_its_whole_subtree() {
    let mut store = store();
    let alice = user(7, "Alice");
    let root = Comment::now(&alice, None, String::from("root"));
    let child = Comment::now(&alice, Some(root.id.clone()), String::from("child"));
    let grandchild = Comment::now(&alice, Some(child.id.clone()), String::from("grandchild"));
    let sibling = Comment::now(&alice, None, String::from("sibling"));
    let nephew = Comment::now(&alice, Some(sibling.id.clone()), String::from("nephew"));
    for c in [&root, &child, &grandchild, &sibling, &nephew] {
        store.post(PAGE, (*c).clone()).await.unwrap();
    }

    store.delete(PAGE, &root).await.unwrap();

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    let mut contents: Vec<&str> = all.iter().map(|c| &c.content as &str).collect();
    contents.sort();
    assert_eq!(contents, ["nephew", "sibling"]);
}

#[tokio::test]
async fn deleting_the_only_thread_leaves_an_empty_page() {
    let mut store = store();
    let alice = user(7, "Alice");
    let c1 = Comment::now(&alice, None, String::from("hi"));
    let c2 = Comment::now(&alice, Some(c1.id.clone()), String::from("reply"));
    store.post(PAGE, c1.clone()).await.unwrap();
    store.post(PAGE, c2).await.unwrap();

    store.delete(PAGE, &c1).await.unwrap();
    assert_eq!(store.fetch_comments(PAGE, &alice).await.unwrap(), vec![]);
}

#[tokio::test]
async fn vote_toggle_round_trips() {
    let mut store = store();
    let alice = user(7, "Alice");
    let mut c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();

    // The UI flips the flag client-side before calling vote
    c1.user_has_upvoted = true;
    store.vote(PAGE, &c1, &alice).await.unwrap();
    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all[0].upvote_count, 1);
    assert!(all[0].user_has_upvoted);

    c1.user_has_upvoted = false;
    store.vote(PAGE, &c1, &alice).await.unwrap();
    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all[0].upvote_count, 0);
    assert!(!all[0].user_has_upvoted);
}

#[tokio::test]
async fn voting_twice_the_same_way_is_idempotent() {
    let mut store = store();
    let alice = user(7, "Alice");
    let mut c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();

    c1.user_has_upvoted = true;
    store.vote(PAGE, &c1, &alice).await.unwrap();
    store.vote(PAGE, &c1, &alice).await.unwrap();

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all[0].upvote_count, 1);
}

#[tokio::test]
async fn votes_from_different_users_accumulate() {
    let mut store = store();
    let alice = user(7, "Alice");
    let bob = user(8, "Bob");
    let carol = user(9, "Carol");
    let mut c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();

    c1.user_has_upvoted = true;
    store.vote(PAGE, &c1, &alice).await.unwrap();
    store.vote(PAGE, &c1, &bob).await.unwrap();

    let as_alice = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(as_alice[0].upvote_count, 2);
    assert!(as_alice[0].user_has_upvoted);

    let as_carol = store.fetch_comments(PAGE, &carol).await.unwrap();
    assert_eq!(as_carol[0].upvote_count, 2);
    assert!(!as_carol[0].user_has_upvoted);
}

#[tokio::test]
async fn voting_on_a_page_without_a_bucket_errors() {
    let mut store = store();
    let alice = user(7, "Alice");
    let mut c1 = Comment::now(&alice, None, String::from("hi"));
    c1.user_has_upvoted = true;
    let err = store.vote(PAGE, &c1, &alice).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Api(ApiError::NoCommentsItem(ref page)) if page.as_str() == PAGE,
    ));
}

#[tokio::test]
async fn malformed_blobs_degrade_to_an_empty_page() {
    let mut store = store();
    let alice = user(7, "Alice");
    store
        .store_mut()
        .test_seed_bucket(PAGE, "{definitely not json", "also garbage");
    assert_eq!(store.fetch_comments(PAGE, &alice).await.unwrap(), vec![]);

    // Posting over the garbage starts the page over cleanly
    let c1 = Comment::now(&alice, None, String::from("fresh start"));
    store.post(PAGE, c1).await.unwrap();
    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content, "fresh start");
}

#[tokio::test]
async fn rejected_writes_are_retried_then_give_up() {
    let mut store = store();
    let alice = user(7, "Alice");
    store
        .post(PAGE, Comment::now(&alice, None, String::from("first")))
        .await
        .unwrap();

    // Two stale rejections still leave a third attempt that lands
    store.store_mut().test_fail_next_writes(2);
    store
        .post(PAGE, Comment::now(&alice, None, String::from("second")))
        .await
        .unwrap();
    assert_eq!(store.fetch_comments(PAGE, &alice).await.unwrap().len(), 2);

    // Three rejections exhaust every attempt
    store.store_mut().test_fail_next_writes(3);
    let err = store
        .post(PAGE, Comment::now(&alice, None, String::from("third")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Api(ApiError::WriteConflict(_))));
    assert_eq!(store.fetch_comments(PAGE, &alice).await.unwrap().len(), 2);
}

#[tokio::test]
async fn editing_replaces_the_record_in_place() {
    let mut store = store();
    let alice = user(7, "Alice");
    let mut c1 = Comment::now(&alice, None, String::from("first"));
    let c2 = Comment::now(&alice, None, String::from("second"));
    store.post(PAGE, c1.clone()).await.unwrap();
    store.post(PAGE, c2.clone()).await.unwrap();

    c1.content = String::from("first, edited");
    store.edit(PAGE, c1.clone()).await.unwrap();

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    let contents: Vec<&str> = all.iter().map(|c| &c.content as &str).collect();
    assert_eq!(contents, ["first, edited", "second"]);
}

#[tokio::test]
async fn editing_an_unknown_id_is_a_silent_noop() {
    let mut store = store();
    let alice = user(7, "Alice");
    let c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();

    let mut ghost = Comment::now(&alice, None, String::from("boo"));
    ghost.id = CommentId(String::from("never-posted"));
    store.edit(PAGE, ghost).await.unwrap();

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].content, "hi");
}

#[tokio::test]
async fn admin_membership_is_checked_and_fails_soft() {
    let mut store = store();
    let alice = user(7, "Alice");
    let bob = user(8, "Bob");
    store.store_mut().test_grant_comment_admin(alice.id);
    assert!(store.is_admin(&alice).await);
    assert!(!store.is_admin(&bob).await);

    store.store_mut().test_make_site_admin(bob.id);
    assert!(store.is_admin(&bob).await);

    store.store_mut().test_break_admin_lookup();
    assert!(!store.is_admin(&alice).await);
    assert!(!store.is_admin(&bob).await);
}

#[tokio::test]
async fn attachments_are_resolved_by_file_name_prefix() {
    let mut store = store();
    let alice = user(7, "Alice");
    let c1 = Comment::now(&alice, None, String::from("see attached"));
    let c2 = Comment::now(&alice, None, String::from("nothing attached"));
    store.post(PAGE, c1.clone()).await.unwrap();
    store.post(PAGE, c2.clone()).await.unwrap();

    let file = format!("{}_diagram.png", c1.id.0);
    let url = format!("/files/{file}");
    store.store_mut().test_add_attachment(PAGE, &file, &url);
    store
        .store_mut()
        .test_add_attachment(PAGE, "unrelated.png", "/files/unrelated.png");

    let all = store.fetch_comments(PAGE, &alice).await.unwrap();
    assert_eq!(all[0].attachments.len(), 1);
    assert_eq!(all[0].attachments[0].name, "diagram.png");
    assert_eq!(all[0].attachments[0].url, url);
    assert!(all[1].attachments.is_empty());
}

#[tokio::test]
async fn stored_blobs_use_the_legacy_wire_format() {
    let mut store = store();
    let alice = user(7, "Alice");
    let mut c1 = Comment::now(&alice, None, String::from("hi"));
    store.post(PAGE, c1.clone()).await.unwrap();
    c1.user_has_upvoted = true;
    store.vote(PAGE, &c1, &alice).await.unwrap();

    let (comments, likes) = store.store_mut().test_raw_blobs(PAGE).unwrap();
    let comments: serde_json::Value = serde_json::from_str(comments).unwrap();
    let likes: serde_json::Value = serde_json::from_str(likes).unwrap();

    let stored = &comments[0];
    assert_eq!(stored["id"], c1.id.0);
    assert_eq!(stored["parent"], serde_json::Value::Null);
    assert_eq!(stored["content"], "hi");
    assert_eq!(stored["fullname"], "Alice");
    assert_eq!(stored["userid"], 7);
    assert!(stored.get("is_new").is_none());
    assert!(stored.get("attachments").is_none());

    assert_eq!(likes[0]["commentID"], c1.id.0);
    assert_eq!(likes[0]["userVote"], serde_json::json!([{ "userid": 7 }]));
}

#[tokio::test]
async fn fetch_tree_nests_and_sorts_for_display() {
    let mut store = store();
    let alice = user(7, "Alice");
    let root = Comment::now(&alice, None, String::from("root"));
    let reply_a = Comment::now(&alice, Some(root.id.clone()), String::from("reply a"));
    let mut reply_b = Comment::now(&alice, Some(root.id.clone()), String::from("reply b"));
    for c in [&root, &reply_a, &reply_b] {
        store.post(PAGE, (*c).clone()).await.unwrap();
    }
    reply_b.user_has_upvoted = true;
    store.vote(PAGE, &reply_b, &alice).await.unwrap();

    let tree = store.fetch_tree(PAGE, &alice, SortOrder::Popular).await.unwrap();
    assert_eq!(tree.len(), 1);
    assert_eq!(tree[0].comment.id, root.id);
    let reply_ids: Vec<&CommentId> = tree[0].replies.iter().map(|n| &n.comment.id).collect();
    // The upvoted reply sorts first; its sibling keeps stored order after it
    assert_eq!(reply_ids, [&reply_b.id, &reply_a.id]);

    let flat = pagetalk_client::flatten(tree);
    assert_eq!(flat.len(), 3);
    let _: Vec<CommentNode> = CommentNode::assemble(flat, SortOrder::Newest);
}
