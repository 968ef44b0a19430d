use multiaxis_rs::PlotError;
use multiaxis_rs::event::EventKind;
use multiaxis_rs::layout::{
    AxisLabels, AxisStackBuilder, AxisStackConfig, LegendLocation, LegendOptions, OffsetUnit,
};
use multiaxis_rs::render::{LineStrokeStyle, LineStyle};
use multiaxis_rs::surface::HeadlessCanvas;

#[test]
fn axis_stack_config_fills_defaults() {
    let config = AxisStackConfig::from_json_str(r#"{"left": ["a", "b"], "right": "c"}"#)
        .expect("parse config");

    assert_eq!(config.left, AxisLabels::many(["a", "b"]));
    assert_eq!(config.right, AxisLabels::Single("c".to_owned()));
    assert_eq!(config.offset_unit, OffsetUnit::Axes);
    assert!((config.offset - 0.055).abs() <= 1e-12);
    assert!(config.grid);
    assert!(config.x_label.is_none());
}

#[test]
fn axis_stack_config_drives_the_builder() {
    let json = r#"{
        "x_label": "t",
        "left": "volts",
        "right": ["amps", "watts"],
        "offset": 30.0,
        "offset_unit": "outward",
        "grid": false
    }"#;
    let config = AxisStackConfig::from_json_str(json).expect("parse config");
    let restored =
        AxisStackConfig::from_json_str(&config.to_json_pretty().expect("serialize"))
            .expect("reparse");
    assert_eq!(restored, config);

    let mut canvas = HeadlessCanvas::new();
    let host = canvas.add_axis();
    let stack = AxisStackBuilder::from_config(host, config)
        .build(&mut canvas)
        .expect("build");
    assert_eq!(stack.len(), 3);
    assert!(!canvas.axis(host).expect("host").grid);
}

#[test]
fn invalid_axis_stack_configs_are_rejected() {
    for json in [
        r#"{"offset": -1.0}"#,
        r#"{"left": ["ok", ""]}"#,
        r#"{"offset_unit": "pixels"}"#,
        r#"{"left": 3}"#,
    ] {
        assert!(
            matches!(
                AxisStackConfig::from_json_str(json),
                Err(PlotError::Configuration(_))
            ),
            "expected configuration error for {json}"
        );
    }
}

#[test]
fn offset_unit_parses_from_names() {
    assert_eq!("outward".parse::<OffsetUnit>(), Ok(OffsetUnit::Outward));
    assert_eq!(OffsetUnit::Axes.to_string(), "axes");
    assert!(matches!(
        "points".parse::<OffsetUnit>(),
        Err(PlotError::Configuration(_))
    ));
}

#[test]
fn legend_options_round_trip() {
    let options = LegendOptions::at(LegendLocation::LowerCenter)
        .with_fancybox(false)
        .with_frame_alpha(0.25);
    let json = options.to_json_pretty().expect("serialize");
    assert!(json.contains("\"lower center\""));
    assert_eq!(LegendOptions::from_json_str(&json), Ok(options));
}

#[test]
fn line_style_defaults_to_solid_stroke() {
    let style: LineStyle = serde_json::from_str(
        r#"{"color": {"red": 0.0, "green": 0.0, "blue": 1.0, "alpha": 1.0}, "width": 2.0}"#,
    )
    .expect("parse line style");
    assert_eq!(style.stroke, LineStrokeStyle::Solid);
    assert!(style.validate().is_ok());
}

#[test]
fn event_kinds_serialize_with_snake_case_names() {
    let json = serde_json::to_string(&EventKind::SurfaceClose).expect("serialize");
    assert_eq!(json, "\"surface_close\"");
}
