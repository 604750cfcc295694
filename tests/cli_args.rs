//! CLI argument parsing tests.

use clap::Parser;
use m2rest::cli::{BulkCommand, Cli, Command, Entity};
use m2rest::Condition;

#[test]
fn test_cli_parses_get_subcommand() {
    let cli = Cli::parse_from(["m2rest", "get", "product", "MH01-XS-Black"]);

    assert!(!cli.json);
    assert!(!cli.debug);
    match cli.command {
        Command::Get { entity, key } => {
            assert_eq!(entity, Entity::Product);
            assert_eq!(key, "MH01-XS-Black");
        }
        _ => panic!("Expected Get command"),
    }
}

#[test]
fn test_entity_aliases() {
    for (arg, expected) in [
        ("products", Entity::Product),
        ("orders", Entity::Order),
        ("categories", Entity::Category),
        ("attributes", Entity::Attribute),
        ("attribute-set", Entity::AttributeSet),
        ("attribute-sets", Entity::AttributeSet),
        ("sets", Entity::AttributeSet),
    ] {
        let cli = Cli::parse_from(["m2rest", "list", arg]);
        match cli.command {
            Command::List { entity, .. } => assert_eq!(entity, expected, "alias {arg}"),
            _ => panic!("Expected List command"),
        }
    }
}

#[test]
fn test_global_flags() {
    let cli = Cli::parse_from(["m2rest", "--json", "list", "products"]);
    assert!(cli.json);

    let cli = Cli::parse_from(["m2rest", "get", "order", "000000001", "--json", "--debug"]);
    assert!(cli.json);
    assert!(cli.debug);
}

#[test]
fn test_list_pagination_and_filters() {
    let cli = Cli::parse_from([
        "m2rest",
        "list",
        "products",
        "--page",
        "2",
        "--count",
        "50",
        "--filter",
        "type_id=simple",
        "--filter",
        "name~%shirt%",
    ]);

    match cli.command {
        Command::List {
            page,
            count,
            filters,
            ..
        } => {
            assert_eq!(page, Some(2));
            assert_eq!(count, Some(50));
            assert_eq!(filters.len(), 2);
            assert_eq!(filters[0].condition, Condition::Eq);
            assert_eq!(filters[1].field, "name");
            assert_eq!(filters[1].condition, Condition::Like);
        }
        _ => panic!("Expected List command"),
    }
}

#[test]
fn test_invalid_filter_is_rejected() {
    let result = Cli::try_parse_from(["m2rest", "list", "products", "--filter", "oops"]);
    assert!(result.is_err());
}

#[test]
fn test_bulk_create_defaults() {
    let cli = Cli::parse_from(["m2rest", "bulk", "create"]);
    match cli.command {
        Command::Bulk(BulkCommand::Create {
            count,
            concurrency,
            csv,
        }) => {
            assert_eq!(count, 100);
            assert_eq!(concurrency, 10);
            assert!(csv.is_none());
        }
        _ => panic!("Expected bulk create"),
    }
}

#[test]
fn test_bulk_update_stock() {
    let cli = Cli::parse_from([
        "m2rest",
        "bulk",
        "update-stock",
        "stock.csv",
        "--concurrency",
        "4",
    ]);
    match cli.command {
        Command::Bulk(BulkCommand::UpdateStock { csv, concurrency }) => {
            assert_eq!(csv.to_str(), Some("stock.csv"));
            assert_eq!(concurrency, 4);
        }
        _ => panic!("Expected bulk update-stock"),
    }
}

#[test]
fn test_unknown_entity_is_rejected() {
    assert!(Cli::try_parse_from(["m2rest", "get", "customer", "1"]).is_err());
}
