use super::*;
use crate::ident::Ident;

fn id(s: &str) -> Ident {
    Ident::parse(s).unwrap()
}

/// Render both sides through the same deparser so formatting never matters.
fn assert_same_sql(stmt: &Statement, expected: &str) {
    let expected = Statement::parse(expected).unwrap().render().unwrap();
    assert_eq!(stmt.render().unwrap(), expected);
}

fn assert_roundtrip_stable(stmt: &Statement) {
    let once = stmt.render().unwrap();
    let twice = Statement::parse(&once).unwrap().render().unwrap();
    assert_eq!(once, twice);
}

const ACCOUNTS: &str = "SELECT a.id, a.display_name FROM accounts a WHERE a.tenant_id = $1";

#[test]
fn parse_rejects_non_templates() {
    assert!(Statement::parse("SELEC id FROM x").unwrap_err().is_fatal());
    assert!(Statement::parse("SELECT 1; SELECT 2").is_err());
    assert!(Statement::parse("DELETE FROM accounts").is_err());
    assert!(Statement::parse("SELECT 1 UNION SELECT 2").is_err());
    assert!(Statement::parse("").is_err());
}

#[test]
fn parse_detects_kind() {
    assert_eq!(Statement::parse(ACCOUNTS).unwrap().kind(), StatementKind::Select);
    assert_eq!(
        Statement::parse("UPDATE tenants SET updated_at = now() WHERE id = $1")
            .unwrap()
            .kind(),
        StatementKind::Update
    );
}

#[test]
fn predicate_on_empty_where_becomes_the_where() {
    let mut stmt = Statement::parse("SELECT t.id FROM tenants t").unwrap();
    stmt.add_predicate(Predicate::is_not_null(id("t.icon"))).unwrap();
    assert_eq!(stmt.conjunct_count(), 1);
    assert_same_sql(&stmt, "SELECT t.id FROM tenants t WHERE t.icon IS NOT NULL");
}

#[test]
fn predicates_flatten_into_one_and() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    stmt.add_predicate(Predicate::compare(id("a.parent_id"), CompareOp::Eq, 2))
        .unwrap();
    stmt.add_predicate(Predicate::like(id("a.display_name"), LikeOp::ILike, 3))
        .unwrap();
    stmt.add_predicate(Predicate::is_null(id("a.icon"))).unwrap();

    assert_eq!(stmt.conjunct_count(), 4);
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a \
         WHERE a.tenant_id = $1 AND a.parent_id = $2 AND a.display_name ILIKE $3 AND a.icon IS NULL",
    );
    assert_roundtrip_stable(&stmt);
}

#[test]
fn flattened_and_matches_hand_written_conjunction() {
    // Adding to an existing AND must equal writing the conjunction out.
    let mut stmt =
        Statement::parse("UPDATE accounts SET updated_at = now() WHERE id = $1 AND tenant_id = $2")
            .unwrap();
    stmt.add_predicate(Predicate::compare(id("parent_id"), CompareOp::Ne, 3))
        .unwrap();
    assert_eq!(stmt.conjunct_count(), 3);
    assert_same_sql(
        &stmt,
        "UPDATE accounts SET updated_at = now() WHERE id = $1 AND tenant_id = $2 AND parent_id <> $3",
    );
}

#[test]
fn every_comparison_operator_renders() {
    let mut stmt = Statement::parse("SELECT tx.id FROM transactions tx").unwrap();
    let ops = [
        CompareOp::Eq,
        CompareOp::Ne,
        CompareOp::Lt,
        CompareOp::Lte,
        CompareOp::Gt,
        CompareOp::Gte,
    ];
    for (i, op) in ops.into_iter().enumerate() {
        stmt.add_predicate(Predicate::compare(id("tx.amount"), op, i as i32 + 1))
            .unwrap();
    }
    stmt.add_predicate(Predicate::like(id("tx.description"), LikeOp::Like, 7))
        .unwrap();
    assert_same_sql(
        &stmt,
        "SELECT tx.id FROM transactions tx WHERE tx.amount = $1 AND tx.amount <> $2 \
         AND tx.amount < $3 AND tx.amount <= $4 AND tx.amount > $5 AND tx.amount >= $6 \
         AND tx.description LIKE $7",
    );
    assert_eq!(stmt.check_ordinals().unwrap(), 7);
}

#[test]
fn any_predicate_is_one_or_conjunct() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    stmt.add_any_predicate(
        Predicate::compare(id("a.id"), CompareOp::Eq, 2),
        Predicate::compare(id("a.parent_id"), CompareOp::Eq, 3),
    )
    .unwrap();
    stmt.add_predicate(Predicate::is_null(id("a.icon"))).unwrap();

    assert_eq!(stmt.conjunct_count(), 3);
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a \
         WHERE a.tenant_id = $1 AND (a.id = $2 OR a.parent_id = $3) AND a.icon IS NULL",
    );
    assert_roundtrip_stable(&stmt);
}

#[test]
fn any_predicate_on_empty_where_is_the_bare_or() {
    let mut stmt = Statement::parse("SELECT t.id FROM tenants t").unwrap();
    stmt.add_any_predicate(
        Predicate::is_null(id("t.icon")),
        Predicate::compare(id("t.icon"), CompareOp::Eq, 1),
    )
    .unwrap();
    assert_eq!(stmt.conjunct_count(), 1);
    assert_same_sql(
        &stmt,
        "SELECT t.id FROM tenants t WHERE t.icon IS NULL OR t.icon = $1",
    );
}

#[test]
fn join_wraps_single_from_entry() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    stmt.add_join(
        JoinKind::Inner,
        &id("tenants"),
        "tn",
        (&id("tn.id"), &id("a.tenant_id")),
    )
    .unwrap();
    stmt.add_predicate(Predicate::like(id("tn.display_name"), LikeOp::ILike, 2))
        .unwrap();

    assert_eq!(stmt.from_aliases().unwrap(), vec!["a", "tn"]);
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a JOIN tenants tn ON tn.id = a.tenant_id \
         WHERE a.tenant_id = $1 AND tn.display_name ILIKE $2",
    );
    assert_roundtrip_stable(&stmt);
}

#[test]
fn independent_joins_chain() {
    let mut stmt = Statement::parse("SELECT tx.id FROM transactions tx").unwrap();
    stmt.add_join(
        JoinKind::Inner,
        &id("accounts"),
        "sa",
        (&id("sa.id"), &id("tx.source_account_id")),
    )
    .unwrap();
    stmt.add_join(
        JoinKind::Left,
        &id("accounts"),
        "ta",
        (&id("ta.id"), &id("tx.target_account_id")),
    )
    .unwrap();

    assert_eq!(stmt.from_aliases().unwrap(), vec!["tx", "sa", "ta"]);
    assert_same_sql(
        &stmt,
        "SELECT tx.id FROM transactions tx \
         JOIN accounts sa ON sa.id = tx.source_account_id \
         LEFT JOIN accounts ta ON ta.id = tx.target_account_id",
    );
}

#[test]
fn join_preconditions_are_structural() {
    let mut stmt = Statement::parse("SELECT a.id FROM accounts a, tenants t").unwrap();
    let err = stmt
        .add_join(
            JoinKind::Inner,
            &id("tenants"),
            "tn",
            (&id("tn.id"), &id("a.tenant_id")),
        )
        .unwrap_err();
    assert!(err.is_fatal());

    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    let err = stmt
        .add_join(
            JoinKind::Inner,
            &id("tenants"),
            "a",
            (&id("a.id"), &id("a.tenant_id")),
        )
        .unwrap_err();
    assert!(matches!(err, crate::LedgerError::Structural(_)));

    let mut update = Statement::parse("UPDATE tenants SET icon = $1").unwrap();
    assert!(
        update
            .add_join(JoinKind::Inner, &id("x"), "x", (&id("x.id"), &id("id")))
            .unwrap_err()
            .is_fatal()
    );
}

#[test]
fn sort_replaces_existing_order() {
    let mut stmt = Statement::parse(
        "SELECT a.id, a.display_name FROM accounts a ORDER BY a.created_at DESC, a.id",
    )
    .unwrap();
    stmt.set_sort(&[SortKey::new(id("a.display_name"), SortDir::Desc)])
        .unwrap();
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a ORDER BY a.display_name DESC",
    );

    stmt.set_sort(&[
        SortKey::new(id("a.icon"), SortDir::Asc).with_nulls(NullsOrder::First),
        SortKey::new(id("a.id"), SortDir::Asc),
    ])
    .unwrap();
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a ORDER BY a.icon ASC NULLS FIRST, a.id ASC",
    );
    assert_roundtrip_stable(&stmt);
}

#[test]
fn paging_embeds_literals() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    stmt.set_limit(3).unwrap();
    stmt.set_offset(6).unwrap();
    assert_same_sql(
        &stmt,
        "SELECT a.id, a.display_name FROM accounts a WHERE a.tenant_id = $1 LIMIT 3 OFFSET 6",
    );
    // Literals never add placeholders.
    assert_eq!(stmt.param_ordinals(), vec![1]);
    assert!(stmt.set_limit(-1).unwrap_err().is_fatal());
}

#[test]
fn count_drops_order_and_paging() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    stmt.add_join(
        JoinKind::Inner,
        &id("tenants"),
        "tn",
        (&id("tn.id"), &id("a.tenant_id")),
    )
    .unwrap();
    stmt.add_predicate(Predicate::like(id("tn.display_name"), LikeOp::ILike, 2))
        .unwrap();
    stmt.set_sort(&[SortKey::new(id("a.display_name"), SortDir::Asc)])
        .unwrap();
    stmt.set_limit(10).unwrap();
    stmt.set_offset(20).unwrap();

    let reparsed = Statement::parse(&stmt.render().unwrap()).unwrap();
    let count = reparsed.into_count().unwrap();
    assert_same_sql(
        &count,
        "SELECT count(*) FROM accounts a JOIN tenants tn ON tn.id = a.tenant_id \
         WHERE a.tenant_id = $1 AND tn.display_name ILIKE $2",
    );
    assert_eq!(count.param_ordinals(), stmt.param_ordinals());
}

#[test]
fn count_requires_select() {
    let update = Statement::parse("UPDATE tenants SET icon = $1").unwrap();
    assert!(update.into_count().unwrap_err().is_fatal());
}

#[test]
fn set_column_appends_targets() {
    let mut stmt =
        Statement::parse("UPDATE accounts SET updated_at = now() WHERE id = $1 AND tenant_id = $2")
            .unwrap();
    let ord = stmt.next_ordinal();
    assert_eq!(ord, 3);
    stmt.set_column(&id("display_name"), ord).unwrap();
    stmt.set_column(&id("icon"), stmt.next_ordinal()).unwrap();

    assert_eq!(stmt.set_targets(), vec!["updated_at", "display_name", "icon"]);
    assert_same_sql(
        &stmt,
        "UPDATE accounts SET updated_at = now(), display_name = $3, icon = $4 \
         WHERE id = $1 AND tenant_id = $2",
    );
    assert_roundtrip_stable(&stmt);

    assert!(stmt.set_column(&id("a.icon"), 5).unwrap_err().is_fatal());
    let mut select = Statement::parse(ACCOUNTS).unwrap();
    assert!(select.set_column(&id("icon"), 2).unwrap_err().is_fatal());
}

#[test]
fn ordinals_must_be_contiguous() {
    let stmt = Statement::parse("SELECT a.id FROM accounts a WHERE a.id = $1 AND a.tenant_id = $3")
        .unwrap();
    assert!(stmt.check_ordinals().unwrap_err().is_fatal());

    let stmt = Statement::parse("SELECT a.id FROM accounts a WHERE a.id = $1 OR a.parent_id = $1")
        .unwrap();
    assert!(stmt.check_ordinals().is_err());
}

#[test]
fn render_with_checks_argument_count() {
    let mut stmt = Statement::parse(ACCOUNTS).unwrap();
    let mut args = ArgumentList::new();
    args.push(uuid::Uuid::nil());
    let ord = args.push(contains_pattern("Root"));
    stmt.add_predicate(Predicate::like(id("a.display_name"), LikeOp::ILike, ord))
        .unwrap();

    let built = stmt.render_with(args).unwrap();
    assert_eq!(built.args().len(), 2);
    assert_eq!(built.params_ref().len(), 2);
    assert!(built.sql().contains("$2"));

    let short = ArgumentList::new();
    assert!(stmt.render_with(short).unwrap_err().is_fatal());
}

#[test]
fn next_ordinal_tracks_tree() {
    let mut stmt = Statement::parse("SELECT t.id FROM tenants t").unwrap();
    assert_eq!(stmt.next_ordinal(), 1);
    stmt.add_predicate(Predicate::compare(id("t.id"), CompareOp::Eq, 1))
        .unwrap();
    assert_eq!(stmt.next_ordinal(), 2);
}
