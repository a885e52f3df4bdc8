use super::*;
use crate::repo::list_content_blocks;
use crate::test_utils::{insert_candidate, insert_owned_candidate, setup_test_db};

fn all(include_hidden: bool) -> CandidateFilter {
    CandidateFilter {
        include_hidden,
        limit: 50,
        ..Default::default()
    }
}

#[test]
fn test_create_candidate_assigns_unique_slugs() {
    let pool = setup_test_db();

    let first = insert_candidate(&pool, "Jane Doe");
    let second = insert_candidate(&pool, "Jane Doe");
    let third = insert_candidate(&pool, "jane   doe!");

    assert_eq!(first.slug, "jane-doe");
    assert_eq!(second.slug, "jane-doe-2");
    assert_eq!(third.slug, "jane-doe-3");
    assert!(!first.verified);
    assert!(!first.hidden);
}

#[test]
fn test_create_candidate_without_usable_slug_characters() {
    let pool = setup_test_db();
    let candidate = insert_candidate(&pool, "???");
    assert_eq!(candidate.slug, "candidate");
}

#[test]
fn test_create_candidate_seeds_default_template() {
    let pool = setup_test_db();
    let candidate = insert_candidate(&pool, "Jane Doe");

    let blocks = list_content_blocks(&pool, candidate.id).unwrap();
    assert_eq!(blocks.len(), 7);
    let positions: Vec<i32> = blocks.iter().map(|b| b.position).collect();
    assert_eq!(positions, (0..7).collect::<Vec<_>>());
}

#[test]
fn test_one_candidate_per_owner() {
    let pool = setup_test_db();
    insert_owned_candidate(&pool, "Jane Doe", "user_1");

    let mut second = NewCandidate::new("Jane Again".to_string());
    second.clerk_user_id = Some("user_1".to_string());
    let err = create_candidate(&pool, second).unwrap_err();

    let diesel_err = err.downcast_ref::<diesel::result::Error>().unwrap();
    assert!(matches!(
        diesel_err,
        diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _)
    ));
    // The failed insert must not leave a partial profile behind
    assert_eq!(count_candidates(&pool).unwrap(), 1);
}

#[test]
fn test_get_by_id_slug_and_owner() {
    let pool = setup_test_db();
    let candidate = insert_owned_candidate(&pool, "Marcus Lee", "user_7");

    assert_eq!(get_candidate(&pool, candidate.id).unwrap().unwrap().name, "Marcus Lee");
    assert_eq!(get_candidate_by_slug(&pool, "marcus-lee").unwrap().unwrap().id, candidate.id);
    assert_eq!(get_candidate_by_owner(&pool, "user_7").unwrap().unwrap().id, candidate.id);
    assert!(get_candidate(&pool, 9999).unwrap().is_none());
    assert!(get_candidate_by_slug(&pool, "nobody").unwrap().is_none());
}

#[test]
fn test_list_candidates_filters() {
    let pool = setup_test_db();
    let austin = insert_candidate(&pool, "Zoe Austin");
    update_candidate(
        &pool,
        austin.id,
        CandidateChanges {
            city: Some(Some("Austin".to_string())),
            state: Some(Some("TX".to_string())),
            position: Some(Some("Mayor".to_string())),
            verified: Some(true),
            ..Default::default()
        },
    )
    .unwrap();
    let hidden = insert_candidate(&pool, "Hidden Person");
    update_candidate(&pool, hidden.id, CandidateChanges { hidden: Some(true), ..Default::default() }).unwrap();
    let other = insert_candidate(&pool, "Amy Boston");

    // Ordered by name, hidden excluded
    let names: Vec<String> = list_candidates(&pool, &all(false)).unwrap().into_iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["Amy Boston", "Zoe Austin"]);

    assert_eq!(list_candidates(&pool, &all(true)).unwrap().len(), 3);

    let by_search = CandidateFilter { search: Some("mayor".to_string()), ..all(false) };
    assert_eq!(list_candidates(&pool, &by_search).unwrap()[0].id, austin.id);

    let by_place = CandidateFilter {
        city: Some("austin".to_string()),
        state: Some("tx".to_string()),
        ..all(false)
    };
    assert_eq!(list_candidates(&pool, &by_place).unwrap().len(), 1);

    let verified = CandidateFilter { verified: Some(true), ..all(false) };
    assert_eq!(list_candidates(&pool, &verified).unwrap().len(), 1);

    let by_ids = CandidateFilter { ids: vec![other.id, hidden.id], ..all(false) };
    let found = list_candidates(&pool, &by_ids).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, other.id);

    let paged = CandidateFilter { limit: 1, offset: 1, ..all(false) };
    assert_eq!(list_candidates(&pool, &paged).unwrap()[0].name, "Zoe Austin");
}

#[test]
fn test_list_candidates_treats_wildcards_literally() {
    let pool = setup_test_db();
    let austin = insert_candidate(&pool, "Zoe Austin");
    update_candidate(
        &pool,
        austin.id,
        CandidateChanges { city: Some(Some("Austin".to_string())), ..Default::default() },
    )
    .unwrap();
    let odd = insert_candidate(&pool, "Pat 100% Local");

    for city in ["%", "_ustin", "Aus%"] {
        let filter = CandidateFilter { city: Some(city.to_string()), ..all(false) };
        assert!(list_candidates(&pool, &filter).unwrap().is_empty(), "city {} matched", city);
    }
    let exact = CandidateFilter { city: Some("AUSTIN".to_string()), ..all(false) };
    assert_eq!(list_candidates(&pool, &exact).unwrap()[0].id, austin.id);

    let by_percent = CandidateFilter { search: Some("100%".to_string()), ..all(false) };
    let found = list_candidates(&pool, &by_percent).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, odd.id);

    let underscore = CandidateFilter { search: Some("_".to_string()), ..all(false) };
    assert!(list_candidates(&pool, &underscore).unwrap().is_empty());
}

#[test]
fn test_update_candidate_keeps_slug_and_clears_fields() {
    let pool = setup_test_db();
    let candidate = insert_candidate(&pool, "Jane Doe");
    update_candidate(&pool, candidate.id, CandidateChanges { bio: Some(Some("Hi".to_string())), ..Default::default() }).unwrap();

    let updated = update_candidate(
        &pool,
        candidate.id,
        CandidateChanges {
            name: Some("Jane Q. Doe".to_string()),
            bio: Some(None),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(updated.name, "Jane Q. Doe");
    assert_eq!(updated.slug, "jane-doe");
    assert_eq!(updated.bio, None);
    assert!(updated.updated_at >= candidate.updated_at);
}

#[test]
fn test_update_missing_candidate_is_not_found() {
    let pool = setup_test_db();
    let err = update_candidate(&pool, 404, CandidateChanges::default()).unwrap_err();
    assert!(matches!(err.downcast_ref::<diesel::result::Error>(), Some(diesel::result::Error::NotFound)));
}

#[test]
fn test_delete_candidate_cascades() {
    let pool = setup_test_db();
    let candidate = insert_candidate(&pool, "Jane Doe");

    assert_eq!(delete_candidate(&pool, candidate.id).unwrap(), 1);
    assert!(get_candidate(&pool, candidate.id).unwrap().is_none());
    assert!(list_content_blocks(&pool, candidate.id).unwrap().is_empty());
    assert_eq!(delete_candidate(&pool, candidate.id).unwrap(), 0);
}

#[test]
fn test_regenerate_candidate_slugs() {
    let pool = setup_test_db();
    let first = insert_candidate(&pool, "Jane Doe");
    let second = insert_candidate(&pool, "Sam Smith");

    // Renames leave slugs stale until regeneration
    update_candidate(&pool, first.id, CandidateChanges { name: Some("Sam Smith".to_string()), ..Default::default() }).unwrap();
    update_candidate(&pool, second.id, CandidateChanges { name: Some("Jane Doe".to_string()), ..Default::default() }).unwrap();

    let changed = regenerate_candidate_slugs(&pool).unwrap();
    assert_eq!(changed, 2);
    assert_eq!(get_candidate(&pool, first.id).unwrap().unwrap().slug, "sam-smith");
    assert_eq!(get_candidate(&pool, second.id).unwrap().unwrap().slug, "jane-doe");

    assert_eq!(regenerate_candidate_slugs(&pool).unwrap(), 0);
}

#[test]
fn test_list_candidate_refs_skips_hidden() {
    let pool = setup_test_db();
    let visible = insert_candidate(&pool, "Jane Doe");
    let hidden = insert_candidate(&pool, "Hidden Person");
    update_candidate(&pool, hidden.id, CandidateChanges { hidden: Some(true), ..Default::default() }).unwrap();

    let refs = list_candidate_refs(&pool).unwrap();
    assert_eq!(refs, vec![(visible.id, "Jane Doe".to_string(), "jane-doe".to_string())]);
}
