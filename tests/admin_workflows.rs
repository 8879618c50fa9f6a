mod support;

use sqlx::PgPool;
use time::macros::date;
use tsunagu::application::admin::{
    AdminError,
    faqs::FaqInput,
    grants::GrantInput,
    interviews::InterviewInput,
    news::NewsInput,
    organizations::{MAX_FEATURED_ORGANIZATIONS, OrganizationInput},
    taxonomy::TaxonomyInput,
};
use tsunagu::application::ordering::MoveOutcome;
use tsunagu::application::pagination::PageRequest;
use tsunagu::application::repos::{
    GrantQueryFilter, GrantsRepo, OrganizationQueryFilter, OrganizationsRepo, PublicationScope,
};
use tsunagu::domain::entities::OrganizationLinks;
use tsunagu::domain::types::{SortDirection, TaxonomyKind};
use tsunagu::infra::db::PostgresRepositories;

fn organization(name: &str) -> OrganizationInput {
    OrganizationInput {
        name: name.to_string(),
        ..OrganizationInput::default()
    }
}

fn faq(question: &str) -> FaqInput {
    FaqInput {
        question: question.to_string(),
        answer: "回答".to_string(),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn colliding_names_get_numbered_slugs(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let first = admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create first");
    let second = admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create second");
    let third = admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create third");

    assert_eq!(first.slug, "sakura-club");
    assert_eq!(second.slug, "sakura-club-1");
    assert_eq!(third.slug, "sakura-club-2");
}

#[sqlx::test(migrations = "./migrations")]
async fn updating_keeps_own_slug(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let record = admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create");
    let updated = admin
        .organizations
        .update(
            record.id,
            OrganizationInput {
                slug: Some("sakura-club".to_string()),
                summary: Some("花見の会".to_string()),
                ..organization("Sakura Club")
            },
        )
        .await
        .expect("update");

    assert_eq!(updated.slug, "sakura-club");
    assert_eq!(updated.summary.as_deref(), Some("花見の会"));
}

#[sqlx::test(migrations = "./migrations")]
async fn unsluggable_name_is_a_field_error(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let err = admin
        .organizations
        .create(organization("★★★"))
        .await
        .expect_err("no slug characters");
    match err {
        AdminError::Validation(fields) => assert!(!fields.get("slug").is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn publish_toggle_keeps_flag_and_timestamp_together(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let record = admin
        .organizations
        .create(organization("Midori Walkers"))
        .await
        .expect("create");
    assert!(!record.is_published);
    assert!(record.published_at.is_none());

    let published = admin
        .organizations
        .toggle_published(record.id)
        .await
        .expect("publish");
    assert!(published.is_published);
    assert!(published.published_at.is_some());

    let hidden = admin
        .organizations
        .toggle_published(record.id)
        .await
        .expect("unpublish");
    assert!(!hidden.is_published);
    assert!(hidden.published_at.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn featured_organizations_are_capped(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let mut ids = Vec::new();
    for name in ["A会", "B会", "C会", "D会"] {
        let record = admin
            .organizations
            .create(organization(name))
            .await
            .expect("create");
        ids.push(record.id);
    }

    for id in &ids[..3] {
        let record = admin
            .organizations
            .toggle_featured(*id)
            .await
            .expect("feature");
        assert!(record.is_featured);
    }

    let err = admin
        .organizations
        .toggle_featured(ids[3])
        .await
        .expect_err("fourth feature must fail");
    assert!(matches!(
        err,
        AdminError::FeaturedLimit { max } if max == MAX_FEATURED_ORGANIZATIONS
    ));
    assert!(
        !admin
            .organizations
            .find(ids[3])
            .await
            .expect("find")
            .is_featured
    );

    admin
        .organizations
        .toggle_featured(ids[0])
        .await
        .expect("unfeature");
    let record = admin
        .organizations
        .toggle_featured(ids[3])
        .await
        .expect("feature after freeing a slot");
    assert!(record.is_featured);
}

#[sqlx::test(migrations = "./migrations")]
async fn faq_moves_swap_neighbors_and_stop_at_the_ends(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let first = admin.faqs.create(faq("Q1")).await.expect("create");
    let second = admin.faqs.create(faq("Q2")).await.expect("create");
    let third = admin.faqs.create(faq("Q3")).await.expect("create");
    assert_eq!(
        (first.sort_order, second.sort_order, third.sort_order),
        (1, 2, 3)
    );

    let outcome = admin
        .faqs
        .move_item(first.id, SortDirection::Up)
        .await
        .expect("move first up");
    assert_eq!(outcome, MoveOutcome::Unchanged);
    let outcome = admin
        .faqs
        .move_item(third.id, SortDirection::Down)
        .await
        .expect("move last down");
    assert_eq!(outcome, MoveOutcome::Unchanged);

    let outcome = admin
        .faqs
        .move_item(third.id, SortDirection::Up)
        .await
        .expect("move last up");
    assert_eq!(outcome, MoveOutcome::Swapped);

    let order: Vec<_> = admin
        .faqs
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|record| record.question)
        .collect();
    assert_eq!(order, ["Q1", "Q3", "Q2"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn taxonomy_in_use_cannot_be_deleted(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let category = admin
        .taxonomy
        .create(
            TaxonomyKind::Category,
            TaxonomyInput {
                name: "子育て".to_string(),
                slug: None,
            },
        )
        .await
        .expect("create category");
    let org = admin
        .organizations
        .create(OrganizationInput {
            links: OrganizationLinks {
                category_ids: vec![category.id],
                ..OrganizationLinks::default()
            },
            ..organization("ひまわり食堂")
        })
        .await
        .expect("create organization");

    let err = admin
        .taxonomy
        .delete(TaxonomyKind::Category, category.id)
        .await
        .expect_err("category is referenced");
    assert!(matches!(err, AdminError::InUse { count: 1 }));

    let usage = admin
        .taxonomy
        .list_with_usage(TaxonomyKind::Category)
        .await
        .expect("usage");
    assert_eq!(usage[0].usage, 1);

    admin
        .organizations
        .delete(org.id)
        .await
        .expect("delete organization");
    admin
        .taxonomy
        .delete(TaxonomyKind::Category, category.id)
        .await
        .expect("unused category deletes");
}

#[sqlx::test(migrations = "./migrations")]
async fn grants_keep_japanese_slugs_and_sort_by_deadline(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool.clone(), dir.path());

    let grant = |title: &str, end| GrantInput {
        title: title.to_string(),
        provider_name: "市民活動課".to_string(),
        application_end_date: end,
        ..GrantInput::default()
    };

    let regional = admin
        .grants
        .create(grant("地域活性化助成金", Some(date!(2025 - 12 - 01))))
        .await
        .expect("create regional");
    assert_eq!(regional.slug, "地域活性化助成金");

    admin
        .grants
        .create(grant("早期募集", Some(date!(2025 - 10 - 15))))
        .await
        .expect("create early");
    admin
        .grants
        .create(grant("通年募集", None))
        .await
        .expect("create rolling");
    admin
        .grants
        .create(grant("年度末募集", Some(date!(2026 - 03 - 31))))
        .await
        .expect("create late");

    let titles: Vec<_> = admin
        .grants
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|record| record.title)
        .collect();
    assert_eq!(titles, ["早期募集", "地域活性化助成金", "年度末募集", "通年募集"]);

    let repos = PostgresRepositories::new(pool);
    let open = GrantsRepo::list_grants(
        &repos,
        PublicationScope::Admin,
        GrantQueryFilter {
            open_on: Some(date!(2025 - 11 - 01)),
        },
        None,
    )
    .await
    .expect("open grants");
    assert_eq!(open.len(), 3);
    assert!(open.iter().all(|record| record.title != "早期募集"));
}

#[sqlx::test(migrations = "./migrations")]
async fn public_scope_hides_drafts(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool.clone(), dir.path());

    let draft = admin
        .news
        .create(NewsInput {
            title: "下書き".to_string(),
            body: "<p>本文</p>".to_string(),
            ..NewsInput::default()
        })
        .await
        .expect("create draft");
    let live = admin
        .news
        .create(NewsInput {
            title: "お知らせ".to_string(),
            body: "<p>本文</p>".to_string(),
            ..NewsInput::default()
        })
        .await
        .expect("create live");
    admin
        .news
        .toggle_published(live.id)
        .await
        .expect("publish");

    let http = support::http_state(pool, dir.path());
    let news = http.site.news().await.expect("public news");
    let ids: Vec<_> = news.iter().map(|record| record.id).collect();
    assert!(ids.contains(&live.id));
    assert!(!ids.contains(&draft.id));
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_an_organization_detaches_its_interviews(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool, dir.path());

    let org = admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create organization");
    let interview = admin
        .interviews
        .create(InterviewInput {
            title: "代表に聞く".to_string(),
            body: "<p>インタビュー</p>".to_string(),
            organization_id: Some(org.id),
            ..InterviewInput::default()
        })
        .await
        .expect("create interview");
    assert_eq!(interview.organization_name.as_deref(), Some("Sakura Club"));

    admin
        .organizations
        .delete(org.id)
        .await
        .expect("delete organization");
    let detached = admin
        .interviews
        .find(interview.id)
        .await
        .expect("interview survives");
    assert!(detached.organization_id.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn public_interviews_hide_unpublished_organizations(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool.clone(), dir.path());

    let org = admin
        .organizations
        .create(organization("Kaede Circle"))
        .await
        .expect("create organization");
    let interview = admin
        .interviews
        .create(InterviewInput {
            title: "活動紹介".to_string(),
            body: "<p>インタビュー</p>".to_string(),
            organization_id: Some(org.id),
            ..InterviewInput::default()
        })
        .await
        .expect("create interview");
    admin
        .interviews
        .toggle_published(interview.id)
        .await
        .expect("publish interview");

    let http = support::http_state(pool, dir.path());
    let public = http
        .site
        .interview(&interview.slug)
        .await
        .expect("public interview");
    assert!(public.organization_id.is_none());
    assert!(public.organization_name.is_none());
    assert!(public.organization_slug.is_none());

    let listed = http.site.interviews().await.expect("public interviews");
    assert_eq!(listed.len(), 1);
    assert!(listed[0].organization_name.is_none());

    let draft_view = admin
        .interviews
        .find(interview.id)
        .await
        .expect("admin interview");
    assert_eq!(draft_view.organization_name.as_deref(), Some("Kaede Circle"));

    admin
        .organizations
        .toggle_published(org.id)
        .await
        .expect("publish organization");
    let public = http
        .site
        .interview(&interview.slug)
        .await
        .expect("public interview");
    assert_eq!(public.organization_slug.as_deref(), Some("kaede-circle"));
}

#[sqlx::test(migrations = "./migrations")]
async fn organization_search_treats_wildcards_literally(pool: PgPool) {
    let dir = tempfile::tempdir().expect("tempdir");
    let admin = support::admin_state(pool.clone(), dir.path());

    admin
        .organizations
        .create(organization("Sakura Club"))
        .await
        .expect("create plain");
    admin
        .organizations
        .create(OrganizationInput {
            summary: Some("参加率100%の会".to_string()),
            ..organization("Hundred Club")
        })
        .await
        .expect("create percent");

    let repos = PostgresRepositories::new(pool);
    let search = |term: &str| OrganizationQueryFilter {
        search: Some(term.to_string()),
        ..OrganizationQueryFilter::default()
    };

    for (term, expected) in [
        ("%", vec!["Hundred Club"]),
        ("_", vec![]),
        ("club", vec!["Hundred Club", "Sakura Club"]),
    ] {
        let page = OrganizationsRepo::list_organizations(
            &repos,
            PublicationScope::Admin,
            &search(term),
            PageRequest::new(None, 20),
        )
        .await
        .expect("search");
        let mut names: Vec<_> = page.items.into_iter().map(|record| record.name).collect();
        names.sort();
        assert_eq!(names, expected, "{term}");
    }
}
