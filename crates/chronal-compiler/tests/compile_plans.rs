//! End-to-end plan compilation against an in-memory catalog.

use chrono::NaiveDate;

use chronal_compiler::{compile, Options, PlanError, SuffixMode};
use chronal_core::{
    DatasetKind, Granularity, MapDescriptor, MemoryCatalog, SpaceTimeDataset, TemporalExtent,
    TemporalType, TimeStamp,
};
use chronal_parser::parse_expression;

fn day(d: u32) -> TimeStamp {
    TimeStamp::Absolute(
        NaiveDate::from_ymd_opt(2001, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

/// Daily maps `<prefix>_1@m .. <prefix>_<count>@m` starting at
/// 2001-01-`first`.
fn daily_dataset_from(name: &str, prefix: &str, first: u32, count: u32) -> SpaceTimeDataset {
    let mut ds = SpaceTimeDataset::new(name, DatasetKind::Raster2d, TemporalType::Absolute);
    ds.granularity = Some("1 day".parse().unwrap());
    for i in 1..=count {
        let d = first + i - 1;
        ds.register_map(
            MapDescriptor::new(
                format!("{prefix}_{i}@m"),
                TemporalExtent::interval(day(d), day(d + 1)),
            )
            .with_range(i as f64, i as f64),
        );
    }
    ds
}

fn daily_dataset(name: &str, prefix: &str, count: u32) -> SpaceTimeDataset {
    daily_dataset_from(name, prefix, 1, count)
}

fn relative_dataset(name: &str, prefix: &str, bounds: &[(i64, i64)]) -> SpaceTimeDataset {
    let mut ds = SpaceTimeDataset::new(name, DatasetKind::Raster2d, TemporalType::Relative);
    for (i, (start, end)) in bounds.iter().enumerate() {
        ds.register_map(
            MapDescriptor::new(
                format!("{prefix}_{i}@m"),
                TemporalExtent::interval(TimeStamp::Relative(*start), TimeStamp::Relative(*end)),
            )
            .with_range(1.0, 1.0),
        );
    }
    ds
}

fn plan_for(catalog: &MemoryCatalog, statement: &str, options: &Options) -> chronal_compiler::CompiledPlan {
    let assignment = parse_expression(statement).unwrap();
    compile(&assignment, catalog, options).unwrap()
}

#[test]
fn neighbor_shift_drops_out_of_range_positions() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 4));
    let plan = plan_for(&catalog, "D = A[-1] + A[1]", &Options::new("d"));

    assert_eq!(plan.outputs.len(), 2);
    assert!(plan.intermediates.is_empty());

    let first = &plan.outputs[0];
    assert_eq!(first.name, "d_00001");
    assert_eq!(first.expression, "(a_1@m + a_3@m)");
    assert_eq!(first.extent, TemporalExtent::interval(day(2), day(3)));
    assert_eq!(first.inputs, vec!["a_1@m", "a_3@m"]);

    let second = &plan.outputs[1];
    assert_eq!(second.name, "d_00002");
    assert_eq!(second.expression, "(a_2@m + a_4@m)");
    assert_eq!(second.extent, TemporalExtent::interval(day(3), day(4)));
}

#[test]
fn nested_operator_materializes_intermediates() {
    let mut catalog = MemoryCatalog::new();
    let mut outer = SpaceTimeDataset::new("M", DatasetKind::Raster2d, TemporalType::Absolute);
    outer.register_map(
        MapDescriptor::new("m_1@m", TemporalExtent::interval(day(1), day(31))).with_range(1.0, 1.0),
    );
    catalog.insert(outer);
    // Strictly inside the container; a daily map sharing its start
    // would relate by `starts`, not `contains`.
    catalog.insert(daily_dataset_from("B", "b", 2, 3));
    catalog.insert(daily_dataset_from("C", "c", 2, 3));

    let plan = plan_for(&catalog, "D = M {+,contains} (B * C)", &Options::new("d"));

    assert_eq!(plan.intermediates.len(), 3);
    for (i, tmp) in plan.intermediates.iter().enumerate() {
        assert!(tmp.is_intermediate);
        assert!(tmp.name.starts_with("tmp_"), "{}", tmp.name);
        assert_eq!(
            tmp.expression,
            format!("(b_{n}@m * c_{n}@m)", n = i + 1)
        );
        assert!(tmp.deps.is_empty());
    }

    assert_eq!(plan.outputs.len(), 1);
    let out = &plan.outputs[0];
    assert!(!out.is_intermediate);
    // All three inner maps chain onto the container map, which keeps
    // its own extent under `contains`.
    assert_eq!(out.extent, TemporalExtent::interval(day(1), day(31)));
    assert_eq!(out.deps.len(), 3);
    for tmp in &plan.intermediates {
        assert!(out.deps.contains(&tmp.name));
        assert!(out.expression.contains(&tmp.name));
    }
    assert_eq!(out.inputs, vec!["m_1@m"]);
}

#[test]
fn recompilation_yields_an_identical_plan() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 4));
    catalog.insert(daily_dataset("B", "b", 4));
    let options = Options::new("d");
    let statement = "D = (A + B) * A[1]";
    let first = plan_for(&catalog, statement, &options);
    let second = plan_for(&catalog, statement, &options);
    assert_eq!(first, second);
}

#[test]
fn constants_fold_into_the_expression() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    let plan = plan_for(&catalog, "D = A + 2 * 3", &Options::new("d"));
    assert_eq!(plan.outputs.len(), 2);
    assert_eq!(plan.outputs[0].expression, "(a_1@m + 6)");
    assert_eq!(plan.outputs[1].expression, "(a_2@m + 6)");
    assert!(plan.intermediates.is_empty());
}

#[test]
fn spatial_offsets_index_the_backing_map() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    let plan = plan_for(&catalog, "D = A[0,1]", &Options::new("d"));
    assert_eq!(plan.outputs.len(), 2);
    assert_eq!(plan.outputs[0].expression, "a_1@m[0,1]");
    assert_eq!(plan.outputs[0].inputs, vec!["a_1@m"]);
}

#[test]
fn depth_and_time_offsets_combine_on_3d_data() {
    let mut catalog = MemoryCatalog::new();
    let mut ds = SpaceTimeDataset::new("A", DatasetKind::Raster3d, TemporalType::Absolute);
    for i in 1..=3 {
        ds.register_map(
            MapDescriptor::new(
                format!("a_{i}@m"),
                TemporalExtent::interval(day(i), day(i + 1)),
            )
            .with_range(i as f64, i as f64),
        );
    }
    catalog.insert(ds);

    // The trailing offset shifts in time; the spatial part rides
    // along on the backing map inside the calc expression.
    let plan = plan_for(&catalog, "D = A[0,1,-1,1]", &Options::new("d"));
    assert_eq!(plan.outputs.len(), 2);
    assert_eq!(plan.outputs[0].expression, "a_2@m[0,1,-1]");
    assert_eq!(plan.outputs[0].extent, TemporalExtent::interval(day(1), day(2)));
    assert_eq!(plan.outputs[0].inputs, vec!["a_2@m"]);
    assert_eq!(plan.outputs[1].expression, "a_3@m[0,1,-1]");
}

#[test]
fn depth_offsets_require_a_3d_dataset() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    let assignment = parse_expression("D = A[1,0,1]").unwrap();
    let err = compile(&assignment, &catalog, &Options::new("d")).unwrap_err();
    assert_eq!(
        err,
        PlanError::DepthOffsetOn2d {
            dataset: "A".to_string()
        }
    );
}

#[test]
fn unknown_dataset_is_rejected() {
    let catalog = MemoryCatalog::new();
    let assignment = parse_expression("D = A + B").unwrap();
    let err = compile(&assignment, &catalog, &Options::new("d")).unwrap_err();
    assert_eq!(err, PlanError::UnknownDataset("A".to_string()));
}

#[test]
fn mixed_temporal_types_are_rejected() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    catalog.insert(relative_dataset("B", "b", &[(0, 1), (1, 2)]));
    let assignment = parse_expression("D = A + B").unwrap();
    let err = compile(&assignment, &catalog, &Options::new("d")).unwrap_err();
    assert_eq!(err, PlanError::MixedTemporalTypes);
}

#[test]
fn existing_outputs_block_the_plan_without_overwrite() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    let mut target = SpaceTimeDataset::new("D", DatasetKind::Raster2d, TemporalType::Absolute);
    target.register_map(MapDescriptor::new(
        "d_00001@m",
        TemporalExtent::interval(day(1), day(2)),
    ));
    catalog.insert(target);

    let assignment = parse_expression("D = A + A").unwrap();
    let err = compile(&assignment, &catalog, &Options::new("d")).unwrap_err();
    assert_eq!(err, PlanError::OutputExists("d_00001".to_string()));

    let mut options = Options::new("d");
    options.overwrite = true;
    assert!(compile(&assignment, &catalog, &options).is_ok());
}

#[test]
fn granularity_sampling_needs_an_input_granularity() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(relative_dataset("A", "a", &[(0, 1)]));
    let assignment = parse_expression("D = A + A").unwrap();
    let mut options = Options::new("d");
    options.granularity_sampling = true;
    let err = compile(&assignment, &catalog, &options).unwrap_err();
    assert_eq!(err, PlanError::GranularityRequired);
}

#[test]
fn granularity_sampling_snaps_extents() {
    let mut catalog = MemoryCatalog::new();
    let mut ds = relative_dataset("A", "a", &[(1, 3)]);
    ds.granularity = Some(Granularity::Relative { step: 2 });
    catalog.insert(ds);
    let mut options = Options::new("d");
    options.granularity_sampling = true;
    let plan = plan_for(&catalog, "D = A", &options);
    assert_eq!(
        plan.outputs[0].extent,
        TemporalExtent::interval(TimeStamp::Relative(0), TimeStamp::Relative(4))
    );
}

#[test]
fn during_inherits_the_container_extent() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset_from("A", "a", 2, 3));
    let mut month = SpaceTimeDataset::new("M", DatasetKind::Raster2d, TemporalType::Absolute);
    month.register_map(
        MapDescriptor::new("m_1@m", TemporalExtent::interval(day(1), day(31))).with_range(1.0, 1.0),
    );
    catalog.insert(month);

    let plan = plan_for(&catalog, "D = A {+,during} M", &Options::new("d"));
    assert_eq!(plan.outputs.len(), 3);
    for out in &plan.outputs {
        assert_eq!(out.extent, TemporalExtent::interval(day(1), day(31)));
    }
    // Equal start times, numeric suffixes still distinct.
    assert_eq!(plan.outputs[0].name, "d_00001");
    assert_eq!(plan.outputs[2].name, "d_00003");
}

#[test]
fn widening_the_relation_set_never_shrinks_the_plan() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(relative_dataset("A", "a", &[(0, 2), (2, 4), (4, 6)]));
    catalog.insert(relative_dataset("B", "b", &[(0, 2), (3, 5), (4, 6)]));

    let narrow = plan_for(&catalog, "D = A {+,equal} B", &Options::new("d"));
    let wide = plan_for(
        &catalog,
        "D = A {+,equal|during|overlaps} B",
        &Options::new("d"),
    );
    assert!(narrow.outputs.len() <= wide.outputs.len());
    assert_eq!(narrow.outputs.len(), 2);
    assert_eq!(wide.outputs.len(), 3);
}

#[test]
fn side_markers_keep_nested_series_sorted() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(relative_dataset("A", "a", &[(0, 100), (2, 3)]));
    catalog.insert(relative_dataset("B", "b", &[(2, 3), (50, 60)]));
    catalog.insert(relative_dataset("C", "c", &[(2, 3), (50, 60)]));

    // The r marker hands the inner outputs B's extents, reversing
    // their start order relative to A; both must still find their
    // equal partner in C.
    let plan = plan_for(
        &catalog,
        "D = (A {+,contains|equal,r} B) {+,equal} C",
        &Options::new("d"),
    );
    assert_eq!(plan.intermediates.len(), 2);
    assert_eq!(plan.outputs.len(), 2);
    assert_eq!(
        plan.outputs[0].extent,
        TemporalExtent::interval(TimeStamp::Relative(2), TimeStamp::Relative(3))
    );
    assert_eq!(
        plan.outputs[1].extent,
        TemporalExtent::interval(TimeStamp::Relative(50), TimeStamp::Relative(60))
    );
}

#[test]
fn disjoint_series_compile_to_an_empty_plan() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(relative_dataset("A", "a", &[(0, 1)]));
    catalog.insert(relative_dataset("B", "b", &[(5, 6)]));
    let plan = plan_for(&catalog, "D = A + B", &Options::new("d"));
    assert!(plan.is_empty());
}

#[test]
fn time_suffix_names_outputs_by_start() {
    let mut catalog = MemoryCatalog::new();
    catalog.insert(daily_dataset("A", "a", 2));
    let mut options = Options::new("d");
    options.suffix = SuffixMode::Time;
    let plan = plan_for(&catalog, "D = A + A", &options);
    assert_eq!(plan.outputs[0].name, "d_2001_01_01T00_00_00");
    assert_eq!(plan.outputs[1].name, "d_2001_01_02T00_00_00");
}
