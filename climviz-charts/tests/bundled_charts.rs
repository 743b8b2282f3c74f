use climviz_charts::datasets::{
    CO2_PER_CAPITA, ENVIRONMENTAL_TAXES, EUROPE_BOUNDARIES, EURO_AREA_20, EU_27, LIVESTOCK,
    PROTECTED_AREAS, RENEWABLE_CAPACITY, TRANSPORT_FUEL, WASTE_MANAGEMENT, WATER_RESOURCES,
};
use climviz_charts::{
    AlluvialChart, ChoroplethChart, DumbbellChart, HeatmapChart, LineChart, LollipopChart,
    Orientation, RadarChart, StackedBarChart, TopNBarChart,
};
use climviz_core::chart::{Chart, ChartPhase, MountedChart, SelectionInput};
use climviz_core::document::{Document, ElementId, Point};
use climviz_core::errors::ClimvizError;
use climviz_core::registry::DatasetRegistry;

fn every_chart() -> Vec<Box<dyn Chart>> {
    vec![
        Box::new(RadarChart::new("CO₂ per capita", CO2_PER_CAPITA)),
        Box::new(HeatmapChart::new("Transport fuel", TRANSPORT_FUEL)),
        Box::new(TopNBarChart::new("Waste", WASTE_MANAGEMENT)),
        Box::new(LollipopChart::new("Waste", WASTE_MANAGEMENT)),
        Box::new(StackedBarChart::new("Water", WATER_RESOURCES)),
        Box::new(ChoroplethChart::new("Protected areas", PROTECTED_AREAS, EUROPE_BOUNDARIES)),
        Box::new(DumbbellChart::new("Livestock", LIVESTOCK)),
        Box::new(AlluvialChart::new("Taxes", ENVIRONMENTAL_TAXES)),
        Box::new(
            TopNBarChart::new("Hydro", RENEWABLE_CAPACITY)
                .with_category("Hydro")
                .with_orientation(Orientation::Vertical)
                .with_exclude([EU_27, EURO_AREA_20])
                .with_axis_label("Megawatts (MW)"),
        ),
        Box::new(LineChart::new("Capacity", RENEWABLE_CAPACITY).with_unit("MW")),
    ]
}

fn tooltip_elements(document: &Document, chart: &MountedChart) -> Vec<ElementId> {
    document
        .elements(chart.root())
        .unwrap()
        .into_iter()
        .filter(|(_, mark)| mark.tooltip.is_some())
        .map(|(id, _)| id)
        .collect()
}

#[test]
fn every_chart_renders_from_bundled_data() {
    let registry = DatasetRegistry::new();
    let mut document = Document::default();

    for chart in every_chart() {
        let title = chart.title().to_string();
        let mounted = MountedChart::mount(chart, &registry, &mut document)
            .unwrap_or_else(|e| panic!("{title}: {e}"));
        assert_eq!(mounted.phase(), ChartPhase::Rendered { generation: 1 });
        assert!(!mounted.controls().is_empty(), "{title} has no controls");
        if title != "CO₂ per capita" {
            assert!(!tooltip_elements(&document, &mounted).is_empty(), "{title} has no tooltips");
        }
    }
    assert_eq!(document.root_count(), 10);
}

#[test]
fn a_single_overlay_across_charts() {
    let registry = DatasetRegistry::new();
    let mut document = Document::default();
    let mounted: Vec<MountedChart> = every_chart()
        .into_iter()
        .skip(1)
        .map(|chart| MountedChart::mount(chart, &registry, &mut document).unwrap())
        .collect();

    for chart in &mounted {
        for (i, element) in tooltip_elements(&document, chart).into_iter().take(3).enumerate() {
            let pointer = Point::new(100.0 + i as f64, 200.0);
            assert!(document.pointer_enter(element, pointer).unwrap());
            document.pointer_move(element, Point::new(120.0, 210.0)).unwrap();
            assert_eq!(document.overlay_count(), 1);
        }
    }

    for chart in mounted {
        chart.unmount(&mut document).unwrap();
    }
    assert_eq!(document.root_count(), 0);
    assert_eq!(document.nodes_outside_roots(), 0);
}

#[test]
fn rejected_selection_keeps_the_drawing() {
    let registry = DatasetRegistry::new();
    let mut document = Document::default();
    let chart = Box::new(HeatmapChart::new("Fuel", TRANSPORT_FUEL));
    let mut heatmap = MountedChart::mount(chart, &registry, &mut document).unwrap();
    let before = document.element_count();

    let err = heatmap
        .select(
            SelectionInput::Entities(vec!["Belgium".to_string(), "Bulgaria".to_string()]),
            &mut document,
        )
        .unwrap_err();
    assert!(matches!(err, ClimvizError::SelectionTooSmall { minimum: 5, attempted: 2 }));
    assert_eq!(document.generation(heatmap.root()), Some(1));
    assert_eq!(document.element_count(), before);
    assert_eq!(heatmap.controls()[0].selected.len(), 5);
}

#[test]
fn year_change_redraws() {
    let registry = DatasetRegistry::new();
    let mut document = Document::default();
    let chart = Box::new(TopNBarChart::new("Waste", WASTE_MANAGEMENT));
    let mut bar = MountedChart::mount(chart, &registry, &mut document).unwrap();

    assert!(bar.select(SelectionInput::Period("2018".to_string()), &mut document).unwrap());
    assert_eq!(document.generation(bar.root()), Some(2));
    assert!(!bar.select(SelectionInput::Period("2018".to_string()), &mut document).unwrap());
    assert_eq!(document.generation(bar.root()), Some(2));
}

#[test]
fn charts_read_from_configuration() {
    let chart: Box<dyn Chart> = serde_json::from_str(
        r#"{
            "type": "LineChart",
            "title": "Renewable capacity",
            "dataset": "renewable-capacity",
            "unit": "MW"
        }"#,
    )
    .unwrap();
    assert_eq!(chart.title(), "Renewable capacity");
    assert!(!chart.is_mounted());

    let registry = DatasetRegistry::new();
    let mut document = Document::default();
    let mounted = MountedChart::mount(chart, &registry, &mut document).unwrap();
    assert_eq!(mounted.controls()[0].selected, ["Lithuania"]);
}
