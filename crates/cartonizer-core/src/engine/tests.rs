use super::*;
use std::collections::HashMap;

fn item(id: &str, dims: (f64, f64, f64), weight: f64, quantity: u32) -> Item {
    Item {
        id: id.to_string(),
        sku: format!("SKU-{}", id.to_uppercase()),
        name: id.to_string(),
        length: dims.0,
        width: dims.1,
        height: dims.2,
        weight,
        quantity,
        category: None,
        fragile: false,
    }
}

fn container(id: &str, dims: (f64, f64, f64), max_weight: f64, cost: f64) -> Container {
    Container {
        id: id.to_string(),
        name: id.to_string(),
        length: dims.0,
        width: dims.1,
        height: dims.2,
        max_weight,
        cost,
        in_stock: 10,
        container_type: ContainerType::Box,
    }
}

fn shipping_catalog() -> Vec<Container> {
    vec![
        container("small", (8.0, 6.0, 4.0), 20.0, 1.50),
        container("medium", (12.0, 9.0, 6.0), 35.0, 2.75),
        container("large", (18.0, 14.0, 10.0), 50.0, 5.00),
    ]
}

fn scenario_a_items() -> Vec<Item> {
    vec![
        item("camera", (10.0, 8.0, 6.0), 5.0, 1),
        item("lens-cap", (4.0, 4.0, 4.0), 1.0, 2),
    ]
}

fn cartonizer(items: Vec<Item>, containers: Vec<Container>, parameters: Parameters) -> Cartonizer {
    Cartonizer::new(CartonizationRequest {
        items,
        containers,
        parameters,
    })
    .unwrap()
}

fn partial_fill() -> Parameters {
    Parameters {
        allow_partial_fill: true,
        ..Parameters::default()
    }
}

fn assigned_quantities(plan: &MultiPackageResult) -> HashMap<String, u32> {
    let mut counts = HashMap::new();
    for package in &plan.packages {
        for assigned in &package.assigned_items {
            *counts.entry(assigned.item.id.clone()).or_insert(0) += assigned.quantity;
        }
    }
    counts
}

fn input_quantities(items: &[Item]) -> HashMap<String, u32> {
    items.iter().map(|i| (i.id.clone(), i.quantity)).collect()
}

fn single(result: &CartonizationResult) -> &SingleResult {
    match &result.detail {
        Recommendation::Single(single) => single,
        Recommendation::Multi(_) => panic!("expected a single-container recommendation"),
    }
}

fn multi(result: &CartonizationResult) -> &MultiPackageResult {
    match &result.detail {
        Recommendation::Multi(multi) => multi,
        Recommendation::Single(_) => panic!("expected a multi-package recommendation"),
    }
}

#[test]
fn test_scenario_a_single_container() {
    let cartonizer = cartonizer(scenario_a_items(), shipping_catalog(), Parameters::default());
    let result = cartonizer.recommend().unwrap();
    let single = single(&result);

    assert_eq!(single.recommended_container.id, "medium");
    assert_eq!(single.total_volume, 608.0);
    assert_eq!(single.total_weight, 7.0);
    assert!((single.utilization - 93.83).abs() < 0.01);
    assert_eq!(single.confidence, 95.0);
    // small is too small, large is under the fill threshold
    assert!(single.alternatives.is_empty());

    assert_eq!(result.primary_container.id, "medium");
    assert_eq!(result.package_count, 1);
    assert!(!result.is_multi_package());
}

#[test]
fn test_scenario_a_dimensional_weight_is_container_volume_over_factor() {
    let cartonizer = cartonizer(scenario_a_items(), shipping_catalog(), Parameters::default());
    let single = cartonizer.select_single(false).unwrap();

    assert_eq!(single.dimensional_weight, 648.0 / 139.0);
    assert_eq!(single.billable_weight, 7.0);
}

#[test]
fn test_partial_fill_reports_alternatives_and_cost_bonus() {
    let cartonizer = cartonizer(scenario_a_items(), shipping_catalog(), partial_fill());
    let single = cartonizer.select_single(false).unwrap();

    assert_eq!(single.recommended_container.id, "medium");
    // 95 base + 4.5 for costing 45% less than the large box
    assert!((single.confidence - 99.5).abs() < 1e-9);

    assert_eq!(single.alternatives.len(), 1);
    let large = &single.alternatives[0];
    assert_eq!(large.container.id, "large");
    assert_eq!(large.cost, 5.0);
    assert_eq!(large.confidence, 50.0);
}

#[test]
fn test_scenario_b_oversized_item_needs_manual_packing() {
    let cartonizer = cartonizer(
        vec![item("crate", (20.0, 20.0, 20.0), 2.0, 1)],
        shipping_catalog(),
        partial_fill(),
    );

    assert!(cartonizer.select_single(false).is_none());
    assert!(cartonizer.split(None).is_none());
    assert!(cartonizer.recommend().is_none());
}

fn scenario_c() -> (Vec<Item>, Vec<Container>, Parameters) {
    let items = vec![item("kettlebell", (6.0, 6.0, 6.0), 8.0, 12)];
    let catalog = vec![
        container("half-crate", (12.0, 6.0, 6.0), 45.0, 1.50),
        container("crate", (12.0, 12.0, 9.0), 45.0, 3.00),
    ];
    let params = Parameters {
        splitting_strategy: Some(SplittingStrategy::Weight),
        max_package_weight: 45.0,
        ..Parameters::default()
    };
    (items, catalog, params)
}

#[test]
fn test_scenario_c_forced_multi_package() {
    let (items, catalog, params) = scenario_c();
    let cartonizer = cartonizer(items.clone(), catalog, params);

    assert!(cartonizer.select_single(false).is_none());

    let result = cartonizer.recommend().unwrap();
    assert!(result.is_multi_package());
    let plan = multi(&result);

    assert!(plan.total_packages >= 3);
    assert_eq!(plan.total_packages as usize, plan.packages.len());
    assert_eq!(plan.splitting_strategy, SplittingStrategy::Weight);
    assert_eq!(plan.total_weight, 96.0);
    assert_eq!(plan.total_cost, 7.5);
    for package in &plan.packages {
        assert!(package.package_weight <= 45.0);
        assert!(package.package_weight <= package.container.max_weight);
    }

    let weakest = plan
        .packages
        .iter()
        .map(|p| p.confidence)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(plan.confidence, weakest);
    assert_eq!(assigned_quantities(plan), input_quantities(&items));

    assert_eq!(result.primary_container, plan.packages[0].container);
    assert_eq!(result.package_count, plan.total_packages);
    assert_eq!(result.confidence, plan.confidence);
}

#[test]
fn test_unpinned_strategy_lets_objective_choose() {
    let (items, catalog, params) = scenario_c();
    let params = Parameters {
        splitting_strategy: None,
        ..params
    };
    let cartonizer = cartonizer(items, catalog, params);

    // Only weight and hybrid respect the 45 lb limit; both need three packages.
    let plan = cartonizer.split(None).unwrap();
    assert_eq!(plan.splitting_strategy, SplittingStrategy::Weight);
    assert_eq!(plan.total_packages, 3);
    assert_eq!(plan.optimization_objective, OptimizationObjective::Balanced);

    assert!(cartonizer.split(Some(SplittingStrategy::Volume)).is_none());
    let hybrid = cartonizer.split(Some(SplittingStrategy::Hybrid)).unwrap();
    assert_eq!(hybrid.total_packages, 3);
}

#[test]
fn test_low_confidence_single_escalates_to_split() {
    let catalog = vec![
        container("cube", (10.0, 10.0, 10.0), 40.0, 1.0),
        container("flat", (20.0, 20.0, 10.0), 100.0, 4.0),
    ];
    let cartonizer = cartonizer(
        vec![item("dumbbell", (10.0, 10.0, 10.0), 30.0, 2)],
        catalog,
        partial_fill(),
    );

    // flat holds both at 50% fill, which scores below the escalation threshold
    assert!(cartonizer.select_single(true).is_none());
    let fallback = cartonizer.select_single(false).unwrap();
    assert_eq!(fallback.recommended_container.id, "flat");
    assert_eq!(fallback.confidence, 65.0);

    let result = cartonizer.recommend().unwrap();
    assert!(result.is_multi_package());
    assert_eq!(result.package_count, 2);
    assert!(result.confidence > fallback.confidence);
    assert_eq!(multi(&result).total_cost, 2.0);
}

#[test]
fn test_low_confidence_single_kept_when_split_impossible() {
    let cartonizer = cartonizer(
        vec![item("mug", (4.0, 4.0, 4.0), 1.0, 1)],
        vec![container("medium", (12.0, 9.0, 6.0), 35.0, 2.75)],
        partial_fill(),
    );

    assert!(cartonizer.select_single(true).is_none());

    let result = cartonizer.recommend().unwrap();
    assert_eq!(single(&result).recommended_container.id, "medium");
    assert_eq!(result.confidence, 50.0);
}

#[test]
fn test_fill_threshold_is_a_hard_filter() {
    let items = vec![item("mug", (4.0, 4.0, 4.0), 1.0, 1)];
    let catalog = vec![container("medium", (12.0, 9.0, 6.0), 35.0, 2.75)];

    let strict = cartonizer(items.clone(), catalog.clone(), Parameters::default());
    assert!(strict.select_single(false).is_none());
    assert!(strict.recommend().is_none());

    let relaxed = cartonizer(items, catalog, partial_fill());
    assert!(relaxed.select_single(false).is_some());
}

#[test]
fn test_recommended_container_is_always_feasible() {
    let item_sets = vec![
        scenario_a_items(),
        vec![item("book", (9.0, 6.0, 1.5), 1.2, 3)],
        vec![item("poster-tube", (17.0, 3.0, 3.0), 0.5, 1)],
        vec![item("brick", (8.0, 4.0, 2.0), 4.5, 4)],
        vec![
            item("shoe-box", (13.0, 8.0, 5.0), 2.0, 1),
            item("socks", (5.0, 4.0, 2.0), 0.2, 6),
        ],
    ];

    for items in item_sets {
        for params in [Parameters::default(), partial_fill()] {
            let cartonizer = cartonizer(items.clone(), shipping_catalog(), params.clone());
            let Some(single) = cartonizer.select_single(false) else {
                continue;
            };
            let chosen = &single.recommended_container;
            let total_weight: f64 = items.iter().map(|i| i.weight * f64::from(i.quantity)).sum();
            assert!(total_weight <= chosen.max_weight);

            let mut bounds = [chosen.length, chosen.width, chosen.height];
            bounds.sort_by(|a, b| b.total_cmp(a));
            for item in &items {
                let mut extents = [item.length, item.width, item.height];
                extents.sort_by(|a, b| b.total_cmp(a));
                assert!(extents.iter().zip(bounds.iter()).all(|(e, b)| e <= b));
            }

            if !params.allow_partial_fill {
                assert!(single.utilization >= params.fill_rate_threshold);
            }
            assert!((0.0..=100.0).contains(&single.confidence));
        }
    }
}

#[test]
fn test_alternatives_ranked_by_cost_and_capped() {
    let catalog = vec![
        container("a", (5.0, 5.0, 5.0), 20.0, 3.0),
        container("b", (6.0, 6.0, 6.0), 20.0, 1.0),
        container("c", (7.0, 7.0, 7.0), 20.0, 2.0),
        container("d", (8.0, 8.0, 8.0), 20.0, 0.5),
        container("e", (9.0, 9.0, 9.0), 20.0, 4.0),
    ];
    let items = vec![item("mug", (4.0, 4.0, 4.0), 1.0, 1)];
    let ids = |single: &SingleResult| -> Vec<String> {
        single
            .alternatives
            .iter()
            .map(|a| a.container.id.clone())
            .collect()
    };

    let by_cost = cartonizer(items.clone(), catalog.clone(), partial_fill());
    let single = by_cost.select_single(false).unwrap();
    assert_eq!(single.recommended_container.id, "a");
    assert_eq!(ids(&single), vec!["d", "b", "c"]);

    let unranked = cartonizer(
        items,
        catalog,
        Parameters {
            optimize_for_cost: false,
            ..partial_fill()
        },
    );
    let single = unranked.select_single(false).unwrap();
    assert_eq!(ids(&single), vec!["b", "c", "d"]);
}

#[test]
fn test_out_of_stock_containers_are_skipped() {
    let mut catalog = shipping_catalog();
    catalog[1].in_stock = 0;

    let in_stock_only = cartonizer(scenario_a_items(), catalog.clone(), Parameters::default());
    assert!(in_stock_only.recommend().is_none());

    let any_stock = cartonizer(
        scenario_a_items(),
        catalog,
        Parameters {
            require_in_stock: false,
            ..Parameters::default()
        },
    );
    let result = any_stock.recommend().unwrap();
    assert_eq!(result.primary_container.id, "medium");
}

#[test]
fn test_fragile_items_are_isolated() {
    let mut glass = item("glass", (6.0, 6.0, 6.0), 2.0, 2);
    glass.fragile = true;
    let items = vec![item("book", (6.0, 6.0, 6.0), 2.0, 2), glass];
    let catalog = vec![
        container("box", (12.0, 6.0, 6.0), 45.0, 1.0),
        container("big", (12.0, 12.0, 12.0), 45.0, 3.0),
    ];
    let cartonizer = cartonizer(items.clone(), catalog, partial_fill());

    let plan = cartonizer.split(Some(SplittingStrategy::Fragility)).unwrap();
    assert_eq!(plan.total_packages, 2);
    assert!(plan.packages[0]
        .assigned_items
        .iter()
        .all(|a| a.item.is_fragile()));
    assert!(plan.packages[1]
        .assigned_items
        .iter()
        .all(|a| !a.item.is_fragile()));
    assert_eq!(plan.packages[0].container.id, "box");
    assert_eq!(assigned_quantities(&plan), input_quantities(&items));
}

#[test]
fn test_category_grouping_keeps_categories_together() {
    let mut books = item("books", (4.0, 4.0, 4.0), 1.0, 3);
    books.category = Some("books".into());
    let mut toys = item("toys", (4.0, 4.0, 4.0), 1.0, 1);
    toys.category = Some("toys".into());
    let cartonizer = cartonizer(
        vec![books, toys],
        vec![container("big", (12.0, 12.0, 12.0), 45.0, 3.0)],
        partial_fill(),
    );

    let plan = cartonizer.split(Some(SplittingStrategy::Category)).unwrap();
    assert_eq!(plan.total_packages, 2);
    assert_eq!(plan.packages[0].assigned_items.len(), 1);
    assert_eq!(plan.packages[0].assigned_items[0].item.id, "books");
    assert_eq!(plan.packages[0].assigned_items[0].quantity, 3);
    assert_eq!(plan.packages[1].assigned_items[0].item.id, "toys");
}

#[test]
fn test_category_and_fragility_respect_package_weight_cap() {
    let mut kettlebell = item("kettlebell", (6.0, 6.0, 6.0), 20.0, 3);
    kettlebell.category = Some("gym".into());
    let mut towel = item("towel", (6.0, 6.0, 6.0), 5.0, 1);
    towel.category = Some("misc".into());
    let items = vec![kettlebell, towel];
    let params = Parameters {
        max_package_weight: 45.0,
        ..partial_fill()
    };
    // The container would carry 60 lb; the package cap must still hold.
    let cartonizer = cartonizer(
        items.clone(),
        vec![container("big", (18.0, 6.0, 6.0), 100.0, 2.0)],
        params,
    );

    for strategy in [SplittingStrategy::Category, SplittingStrategy::Fragility] {
        let plan = cartonizer.split(Some(strategy)).unwrap();
        for package in &plan.packages {
            assert!(
                package.package_weight <= 45.0,
                "{strategy} packed {} lb",
                package.package_weight
            );
        }
        assert_eq!(assigned_quantities(&plan), input_quantities(&items));
    }

    let by_category = cartonizer.split(Some(SplittingStrategy::Category)).unwrap();
    assert_eq!(by_category.total_packages, 3);
}

#[test]
fn test_large_quantities_split_in_bulk() {
    let items = vec![item("washer", (1.0, 1.0, 1.0), 10.0, 100_000)];
    let cartonizer = cartonizer(
        items.clone(),
        vec![container("box", (5.0, 5.0, 5.0), 50.0, 1.0)],
        partial_fill(),
    );

    let plan = cartonizer.split(Some(SplittingStrategy::Weight)).unwrap();
    assert_eq!(plan.total_packages, 20_000);
    assert!(plan.packages.iter().all(|p| p.assigned_items[0].quantity == 5));
    assert_eq!(assigned_quantities(&plan), input_quantities(&items));
}

#[test]
fn test_every_strategy_conserves_item_units() {
    let mut items = vec![
        item("a", (5.0, 5.0, 5.0), 4.0, 3),
        item("b", (5.0, 5.0, 5.0), 4.0, 3),
        item("c", (5.0, 5.0, 5.0), 4.0, 3),
    ];
    items[0].category = Some("tools".into());
    items[1].fragile = true;
    let catalog = vec![
        container("medium", (10.0, 10.0, 10.0), 40.0, 2.0),
        container("big", (20.0, 20.0, 20.0), 100.0, 5.0),
    ];
    let params = Parameters {
        max_package_weight: 20.0,
        ..partial_fill()
    };
    let cartonizer = cartonizer(items.clone(), catalog, params);

    let weight_plan = cartonizer.split(Some(SplittingStrategy::Weight)).unwrap();
    assert!(weight_plan.packages.iter().all(|p| p.package_weight <= 20.0));

    for strategy in SplittingStrategy::ALL {
        if let Some(plan) = cartonizer.split(Some(strategy)) {
            assert_eq!(
                assigned_quantities(&plan),
                input_quantities(&items),
                "{strategy} lost or duplicated units"
            );
            assert!((0.0..=100.0).contains(&plan.confidence));
        }
    }
}

#[test]
fn test_recommendation_is_deterministic() {
    let (items, catalog, params) = scenario_c();
    let first = cartonizer(items.clone(), catalog.clone(), params.clone()).recommend();
    let second = cartonizer(items, catalog, params).recommend();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_invalid_input_fails_fast() {
    let request = |items: Vec<Item>, containers: Vec<Container>, parameters: Parameters| {
        CartonizationRequest {
            items,
            containers,
            parameters,
        }
    };

    let err = Cartonizer::new(request(vec![], shipping_catalog(), Parameters::default()));
    assert!(matches!(err, Err(CartonizerError::NoItems)));

    // Item data is checked before the catalog.
    let err = Cartonizer::new(request(
        vec![item("ghost", (1.0, 1.0, 1.0), 1.0, 0)],
        vec![],
        Parameters::default(),
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidItem { .. })));

    let err = Cartonizer::new(request(scenario_a_items(), vec![], Parameters::default()));
    assert!(matches!(err, Err(CartonizerError::EmptyCatalog)));

    let mut refund = container("refund", (1.0, 1.0, 1.0), 1.0, 1.0);
    refund.cost = -1.0;
    let err = Cartonizer::new(request(
        scenario_a_items(),
        vec![refund],
        Parameters::default(),
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidContainer { .. })));

    let err = Cartonizer::new(request(
        scenario_a_items(),
        shipping_catalog(),
        Parameters {
            dimensional_weight_factor: 0.0,
            ..Parameters::default()
        },
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidParameters(_))));

    let err = Cartonizer::new(request(
        scenario_a_items(),
        shipping_catalog(),
        Parameters {
            packing_efficiency: 120.0,
            ..Parameters::default()
        },
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidParameters(_))));

    let err = Cartonizer::new(request(
        scenario_a_items(),
        shipping_catalog(),
        Parameters {
            escalation_threshold: f64::NAN,
            ..Parameters::default()
        },
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidParameters(_))));

    let err = Cartonizer::new(request(
        scenario_a_items(),
        shipping_catalog(),
        Parameters {
            confidence_buckets: ConfidenceBuckets {
                high: 80.0,
                medium: 60.0,
                low: -1.0,
            },
            ..Parameters::default()
        },
    ));
    assert!(matches!(err, Err(CartonizerError::InvalidParameters(_))));
}

#[test]
fn test_cartonize_entry_point() {
    let request = CartonizationRequest {
        items: scenario_a_items(),
        containers: shipping_catalog(),
        parameters: Parameters::default(),
    };
    let result = crate::cartonize(request).unwrap().unwrap();
    assert_eq!(result.primary_container.id, "medium");
}
