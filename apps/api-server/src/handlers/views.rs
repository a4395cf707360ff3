//! Response builders: core views in, wire DTOs out.

use scribe_core::domain::{Category, Tag, User};
use scribe_core::query::Page;
use scribe_core::services::{
    BlogStats, CategoryView, CommentView, LikeToggle, PostDetail, PostSummary, TagView, UserProfile,
};
use scribe_shared::PaginatedResponse;
use scribe_shared::dto::{
    AuthorResponse, CategoryRef, CategoryResponse, CommentResponse, LikeResponse,
    PostDetailResponse, PostStatsResponse, PostSummaryResponse, StatsResponse, TagRef, TagResponse,
    UserResponse, UserStatsResponse,
};
use uuid::Uuid;

pub fn paginated<T, U>(page: Page<T>, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
    let (total, number, size) = (page.total, page.page, page.page_size);
    let results = page.items.into_iter().map(f).collect();
    PaginatedResponse::new(results, total, number, size)
}

pub fn user(profile: UserProfile) -> UserResponse {
    let UserProfile { user, post_count } = profile;
    UserResponse {
        id: user.id,
        full_name: user.full_name(),
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        bio: user.bio,
        location: user.location,
        birth_date: user.birth_date,
        avatar: user.avatar,
        is_verified: user.is_verified,
        posts_count: post_count,
        last_login: user.last_login,
        created_at: user.created_at,
    }
}

pub fn author(user: &User) -> AuthorResponse {
    AuthorResponse {
        id: user.id,
        username: user.username.clone(),
        full_name: user.full_name(),
        avatar: user.avatar.clone(),
    }
}

fn category_ref(category: &Category) -> CategoryRef {
    CategoryRef {
        id: category.id,
        name: category.name.clone(),
        slug: category.slug.clone(),
    }
}

fn tag_ref(tag: &Tag) -> TagRef {
    TagRef {
        id: tag.id,
        name: tag.name.clone(),
        slug: tag.slug.clone(),
    }
}

pub fn category(view: CategoryView) -> CategoryResponse {
    CategoryResponse {
        id: view.category.id,
        name: view.category.name,
        slug: view.category.slug,
        description: view.category.description,
        posts_count: view.post_count,
        created_at: view.category.created_at,
    }
}

pub fn tag(view: TagView) -> TagResponse {
    TagResponse {
        id: view.tag.id,
        name: view.tag.name,
        slug: view.tag.slug,
        posts_count: view.post_count,
        created_at: view.tag.created_at,
    }
}

pub fn post_summary(summary: PostSummary) -> PostSummaryResponse {
    let post = &summary.post;
    PostSummaryResponse {
        id: post.id,
        title: post.title.clone(),
        slug: post.slug.clone(),
        excerpt: post.excerpt.clone(),
        status: post.status.to_string(),
        featured_image: post.featured_image.clone(),
        is_featured: post.is_featured,
        author: author(&summary.author),
        category: summary.category.as_ref().map(category_ref),
        tags: summary.tags.iter().map(tag_ref).collect(),
        views_count: post.views_count,
        likes_count: post.likes_count,
        comments_count: summary.comments_count,
        reading_time: post.reading_time(),
        published_at: post.published_at,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

pub fn post_detail(detail: PostDetail) -> PostDetailResponse {
    let content = detail.summary.post.content.clone();
    PostDetailResponse {
        summary: post_summary(detail.summary),
        content,
        comments: detail.comments.into_iter().map(comment).collect(),
        is_liked: detail.is_liked,
    }
}

pub fn comment(view: CommentView) -> CommentResponse {
    let CommentView {
        comment,
        author: comment_author,
        replies_count,
    } = view;
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        author: author(&comment_author),
        parent_id: comment.parent_id,
        is_reply: comment.is_reply(),
        content: comment.content,
        is_approved: comment.is_approved,
        replies_count,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
    }
}

pub fn like(post_id: Uuid, toggle: LikeToggle) -> LikeResponse {
    match toggle {
        LikeToggle::Liked { like, likes_count } => LikeResponse {
            post_id,
            liked: true,
            likes_count,
            created_at: Some(like.created_at),
        },
        LikeToggle::Unliked { likes_count } => LikeResponse {
            post_id,
            liked: false,
            likes_count,
            created_at: None,
        },
    }
}

pub fn post_stats(stats: &BlogStats) -> PostStatsResponse {
    PostStatsResponse {
        total_posts: stats.posts.total_posts,
        published_posts: stats.posts.published_posts,
        draft_posts: stats.posts.draft_posts,
        total_views: stats.posts.total_views,
        total_likes: stats.total_likes,
        total_comments: stats.total_comments,
    }
}

pub fn user_stats(stats: &BlogStats) -> UserStatsResponse {
    UserStatsResponse {
        total_users: stats.users.total_users,
        verified_users: stats.users.verified_users,
        active_users: stats.users.active_users,
    }
}

pub fn stats(stats: BlogStats) -> StatsResponse {
    StatsResponse {
        posts: post_stats(&stats),
        users: user_stats(&stats),
    }
}
