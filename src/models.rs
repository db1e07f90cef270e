use serde::{Deserialize, Serialize};

/// A post record as served by the remote API and held in the local store.
///
/// The remote payload has no `favorite` field; it defaults to `false` on
/// deserialization and is only ever flipped through the local store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    /// Unique post id
    pub id: i64,
    /// Id of the owning author
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Post title
    pub title: String,
    /// Post body text
    pub body: String,
    /// Whether the user marked this post as a favorite (local-only)
    #[serde(default)]
    pub favorite: bool,
}

/// Geographic coordinates of an author's address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Geo {
    pub lat: String,
    pub lng: String,
}

/// An author's postal address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Address {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: Geo,
}

/// An author's company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Company {
    pub name: String,
    #[serde(rename = "catchPhrase")]
    pub catch_phrase: String,
    pub bs: String,
}

/// An author (a "user" on the wire), immutable per fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    /// Unique author id, referenced by `Post::user_id`
    pub id: i64,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub address: Address,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub company: Company,
}

/// A comment attached to a post, immutable per fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    /// Id of the post this comment belongs to
    #[serde(rename = "postId")]
    pub post_id: i64,
    /// Unique comment id
    pub id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// A post joined with its resolved author and matching comments, ready
/// for display.
///
/// Derived and recomputed by the join engine, never persisted.
/// `menu_visible` and `deleted` are transient presentation flags and
/// always start out `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedPost {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub favorite: bool,
    /// Transient UI flag, not persisted
    pub menu_visible: bool,
    /// Transient tombstone flag, not persisted
    pub deleted: bool,
    /// The owning author (`author.id == user_id`)
    pub author: Author,
    /// All comments with `post_id == id`, in snapshot order
    pub comments: Vec<Comment>,
}

impl JoinedPost {
    /// Join a post with its author and comments.
    pub fn new(post: Post, author: Author, comments: Vec<Comment>) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            favorite: post.favorite,
            menu_visible: false,
            deleted: false,
            author,
            comments,
        }
    }
}
