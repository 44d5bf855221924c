use cardsmith::assets::solid_png;
use cardsmith::batch::{BatchOptions, parse_records, render_batch};
use cardsmith::compose::{Element, ImageRole};
use cardsmith::config::OverflowPolicy;
use cardsmith::layout_dump::write_layout_dump;
use cardsmith::render::render_svg;
use cardsmith::{
    AssetKind, CardError, CardRecord, CardRenderer, Config, FontBook, MemoryAssets, RenderContext, Rgb,
};
use resvg::tiny_skia::Pixmap;

const WHITE: [u8; 4] = [255, 255, 255, 255];

fn reference_assets() -> MemoryAssets {
    MemoryAssets::new()
        .with(AssetKind::Layout, "layout.png", solid_png(750, 1050, WHITE).unwrap())
        .with(AssetKind::Artwork, "penis.png", solid_png(400, 300, [90, 140, 90, 255]).unwrap())
        .with(AssetKind::Icon, "creature", solid_png(400, 400, [10, 10, 10, 255]).unwrap())
        .with(AssetKind::Icon, "magic", solid_png(400, 400, [10, 10, 10, 255]).unwrap())
        .with(AssetKind::Icon, "both", solid_png(500, 500, [200, 0, 0, 255]).unwrap())
        .with(AssetKind::Icon, "cum", solid_png(500, 500, [0, 0, 200, 255]).unwrap())
}

fn cum_snail() -> CardRecord {
    serde_json::from_str(
        r#"{
            "name": "Cum Snail",
            "category": "mythical",
            "description": "It sticks everywhere.",
            "effect": "Rub each others genitals for 2 minutes.",
            "attributes": {"genders": "both", "cum": "cum"},
            "image": "penis.png"
        }"#,
    )
    .unwrap()
}

fn test_config() -> Config {
    Config::with_system_fonts("sans-serif")
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-2
}

#[test]
fn cum_snail_end_to_end() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let renderer = CardRenderer::new(cum_snail(), ctx);
    let rendered = renderer.render().unwrap();

    assert_eq!((rendered.canvas.width, rendered.canvas.height), (760, 1060));
    assert_eq!(rendered.theme.accent, Rgb::GOLD);
    assert_eq!(rendered.theme.class_icon, "creature");
    assert!(rendered.missing_icons.is_empty());

    let medallions: Vec<_> = rendered.canvas.medallions().collect();
    assert_eq!(medallions.len(), 3, "class medallion plus two attributes");
    assert!(approx(medallions[1].top(), 0.71 * 1060.0));
    assert!(approx(medallions[2].top(), 0.71 * 1060.0 + 100.0));

    let class_icons: Vec<_> = rendered.canvas.images(ImageRole::ClassIcon).collect();
    assert_eq!(class_icons.len(), 1);
    if let Element::Image { width, height, .. } = class_icons[0] {
        assert!(approx(*width, 60.0) && approx(*height, 60.0));
    }
    let attribute_icons: Vec<_> = rendered.canvas.images(ImageRole::AttributeIcon).collect();
    assert_eq!(attribute_icons.len(), 2);
    if let Element::Image { width, .. } = attribute_icons[0] {
        assert!(approx(*width, 45.0));
    }

    let dir = tempfile::tempdir().unwrap();
    let path = renderer.export(dir.path()).unwrap();
    assert_eq!(path.file_name().unwrap(), "cum_snail.png");

    let pixmap = Pixmap::load_png(&path).unwrap();
    assert_eq!((pixmap.width(), pixmap.height()), (760, 1060));
    let border = pixmap.pixel(1, 1).unwrap();
    assert_eq!((border.red(), border.green(), border.blue()), (0, 0, 0));
    let base = pixmap.pixel(20, 20).unwrap();
    assert_eq!((base.red(), base.green(), base.blue()), (255, 255, 255));
    let line = pixmap.pixel(400, 660).unwrap();
    assert_eq!((line.red(), line.green(), line.blue()), (212, 175, 55));
}

#[test]
fn details_text_flows_downwards_in_order() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let rendered = CardRenderer::new(cum_snail(), ctx).render().unwrap();
    let lines: Vec<_> = rendered.canvas.text_lines().collect();
    let texts: Vec<_> = lines.iter().map(|(text, _)| *text).collect();
    assert_eq!(
        texts,
        [
            "CUM SNAIL",
            "Mythical Encounter",
            "It sticks everywhere.",
            "Effect: Rub each others genitals for 2",
            "minutes.",
        ]
    );

    // Width-table metrics: ascent 0.8em, descent 0.2em.
    let expected = [752.8, 781.8, 819.8, 870.8, 905.8];
    for ((_, baseline), want) in lines.iter().zip(expected) {
        assert!(approx(*baseline, want), "baseline {baseline} vs {want}");
    }

    let type_color = rendered.canvas.elements().iter().find_map(|el| match el {
        Element::Text { text, color, .. } if text == "Mythical Encounter" => Some(*color),
        _ => None,
    });
    assert_eq!(type_color, Some(Rgb::GOLD));
}

#[test]
fn elements_follow_paint_order() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let rendered = CardRenderer::new(cum_snail(), ctx).render().unwrap();
    let kinds: Vec<&str> = rendered
        .canvas
        .elements()
        .iter()
        .map(|el| match el {
            Element::Fill { .. } => "fill",
            Element::Image { role: ImageRole::Base, .. } => "base",
            Element::Image { role: ImageRole::Artwork, .. } => "artwork",
            Element::Image { .. } => "icon",
            Element::Line { .. } => "line",
            Element::Medallion { .. } => "medallion",
            Element::Polygon { .. } => "diamond",
            Element::Text { .. } => "text",
        })
        .collect();
    assert_eq!(
        kinds,
        [
            "fill", "base", "artwork", "line", "medallion", "icon", "diamond", "medallion", "icon", "medallion",
            "icon", "text", "text", "text", "text", "text",
        ]
    );
}

#[test]
fn missing_artwork_fails_the_card() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.artwork = "nowhere.png".into();
    match CardRenderer::new(record, ctx).render() {
        Err(CardError::ArtworkMissing(key)) => assert_eq!(key, "nowhere.png"),
        other => panic!("expected ArtworkMissing, got {other:?}"),
    }
}

#[test]
fn missing_attribute_icon_keeps_the_ring() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.attributes = [("genders", "unknown-icon")].into_iter().collect();
    let rendered = CardRenderer::new(record, ctx).render().unwrap();
    assert_eq!(rendered.missing_icons, ["unknown-icon"]);
    assert_eq!(rendered.canvas.medallions().count(), 2);
    assert_eq!(rendered.canvas.images(ImageRole::AttributeIcon).count(), 0);
}

#[test]
fn missing_class_icon_is_recoverable() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.category = "buff".into();
    let rendered = CardRenderer::new(record, ctx).render().unwrap();
    assert_eq!(rendered.theme.accent, Rgb::TEAL);
    assert_eq!(rendered.missing_icons, ["buff"]);
    assert_eq!(rendered.canvas.images(ImageRole::ClassIcon).count(), 0);
}

#[test]
fn card_without_attributes_draws_only_the_class_medallion() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.attributes = Default::default();
    record.effect = None;
    let rendered = CardRenderer::new(record, ctx).render().unwrap();
    assert_eq!(rendered.canvas.medallions().count(), 1);
    assert_eq!(rendered.canvas.images(ImageRole::AttributeIcon).count(), 0);
    assert!(rendered.canvas.text_lines().all(|(text, _)| !text.starts_with("Effect:")));
}

#[test]
fn eight_attributes_stack_without_overlap() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.attributes = (0..8).map(|idx| (format!("attr{idx}"), "cum")).collect();
    let rendered = CardRenderer::new(record, ctx).render().unwrap();
    let attribute_medallions: Vec<_> = rendered.canvas.medallions().skip(1).collect();
    assert_eq!(attribute_medallions.len(), 8);
    for pair in attribute_medallions.windows(2) {
        assert!(approx(pair[1].cy - pair[0].cy, 100.0));
        assert!(pair[0].bottom() < pair[1].top());
    }
}

#[test]
fn unknown_category_and_empty_name_are_rejected() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let mut record = cum_snail();
    record.category = "Mythical".into();
    assert!(matches!(
        CardRenderer::new(record, ctx).render(),
        Err(CardError::CategoryUnknown(_))
    ));

    let mut record = cum_snail();
    record.name = "  ".into();
    assert!(matches!(CardRenderer::new(record, ctx).render(), Err(CardError::EmptyName)));
}

#[test]
fn overflow_policy_decides_long_text() {
    let mut config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let mut record = cum_snail();
    record.description = "slime ".repeat(120);

    {
        let ctx = RenderContext {
            config: &config,
            fonts: &fonts,
            assets: &assets,
        };
        assert!(CardRenderer::new(record.clone(), ctx).render().is_ok());
    }

    config.text.overflow = OverflowPolicy::Reject;
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    match CardRenderer::new(record, ctx).render() {
        Err(CardError::TextOverflow { cursor, limit }) => {
            assert!(cursor > limit);
            assert_eq!(limit, 1055.0);
        }
        other => panic!("expected TextOverflow, got {other:?}"),
    }
}

#[test]
fn svg_carries_every_layer() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let rendered = CardRenderer::new(cum_snail(), ctx).render().unwrap();
    let svg = render_svg(&rendered.canvas, &fonts);
    assert!(svg.starts_with("<svg"));
    assert!(svg.ends_with("</svg>"));
    assert!(svg.contains("width=\"760\" height=\"1060\""));
    assert!(svg.contains("CUM SNAIL"));
    assert!(svg.contains("stroke=\"#d4af37\""));
    assert_eq!(svg.matches("<circle").count(), 3);
    assert_eq!(svg.matches("<polygon").count(), 1);
}

#[test]
fn batch_isolates_failing_cards() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let entries = parse_records(
        r#"[
            {"name": "Cum Snail", "type": "mythical", "info": "It sticks everywhere.", "image": "penis.png",
             "attributes": {"genders": "both"}},
            {"name": "Broken", "type": "legendary", "info": "x", "image": "penis.png"},
            {"type": "magic"},
            {"name": "Spell Book", "type": "magic", "info": "Pages.", "effect": "Read one.", "image": "penis.png"}
        ]"#,
    )
    .unwrap();
    assert_eq!(entries.len(), 4);

    for jobs in [1, 3] {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions {
            output_dir: dir.path().to_path_buf(),
            jobs,
            dump_layout: true,
        };
        let report = render_batch(&entries, ctx, &options);
        let exported: Vec<_> = report.exported().map(|(name, _)| name).collect();
        assert_eq!(exported, ["Cum Snail", "Spell Book"], "jobs = {jobs}");
        let failed: Vec<_> = report.failures().map(|(name, _)| name).collect();
        assert_eq!(failed, ["Broken", "card #3"]);
        assert!(dir.path().join("cum_snail.png").exists());
        assert!(dir.path().join("spell_book.png").exists());
        assert!(dir.path().join("spell_book.layout.json").exists());
    }
}

#[test]
fn layout_dump_is_json() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let record = cum_snail();
    let rendered = CardRenderer::new(record.clone(), ctx).render().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dump.json");
    write_layout_dump(&path, &record, &rendered).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["slug"], "cum_snail");
    assert_eq!(value["category"], "mythical");
    assert_eq!(value["class_icon"], "creature");
    assert_eq!(value["width"], 760);
    assert_eq!(value["elements"][0]["kind"], "fill");
}

#[test]
fn icons_are_centred_in_their_medallions() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let rendered = CardRenderer::new(cum_snail(), ctx).render().unwrap();
    let geometry = &rendered.geometry;

    let centre = |el: &Element| match el {
        Element::Image {
            x, y, width, height, ..
        } => (x + width / 2.0, y + height / 2.0),
        other => panic!("not an image: {other:?}"),
    };

    let medallions: Vec<_> = rendered.canvas.medallions().copied().collect();
    let class = medallions[0];
    assert!(approx(class.cx, geometry.description_left / 2.0));
    assert!(approx(class.cx, 114.0));
    let class_icon = rendered.canvas.images(ImageRole::ClassIcon).next().unwrap();
    let (cx, cy) = centre(class_icon);
    assert!(approx(cx, class.cx) && approx(cy, class.cy), "class icon at ({cx}, {cy})");

    let attribute_icons: Vec<_> = rendered.canvas.images(ImageRole::AttributeIcon).collect();
    assert_eq!(attribute_icons.len(), 2);
    for (icon, medallion) in attribute_icons.into_iter().zip(&medallions[1..]) {
        let (cx, cy) = centre(icon);
        assert!(
            approx(cx, medallion.cx) && approx(cy, medallion.cy),
            "attribute icon at ({cx}, {cy}), medallion at ({}, {})",
            medallion.cx,
            medallion.cy
        );
    }

    let diamond = rendered
        .canvas
        .elements()
        .iter()
        .find_map(|el| match el {
            Element::Polygon { points, .. } => Some(points.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(diamond.len(), 4);
    let mid_x = diamond.iter().map(|p| p.0).sum::<f32>() / 4.0;
    let mid_y = diamond.iter().map(|p| p.1).sum::<f32>() / 4.0;
    assert!(approx(mid_x, 0.92 * 760.0), "diamond x {mid_x}");
    assert!(approx(mid_y, 0.623 * 1060.0), "diamond y {mid_y}");
}

#[test]
fn names_with_path_parts_stay_in_the_output_dir() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let root = tempfile::tempdir().unwrap();
    let out = root.path().join("cards");

    for (name, file) in [("../Escaped Card", "___escaped_card.png"), ("Who/What", "who_what.png")] {
        let mut record = cum_snail();
        record.name = name.to_string();
        let path = CardRenderer::new(record, ctx).export(&out).unwrap();
        assert_eq!(path, out.join(file));
        assert!(path.exists());
    }
    assert!(!root.path().join("escaped_card.png").exists());
}

#[test]
fn colliding_slugs_fail_the_later_card() {
    let config = test_config();
    let fonts = FontBook::load(&config).unwrap();
    let assets = reference_assets();
    let ctx = RenderContext {
        config: &config,
        fonts: &fonts,
        assets: &assets,
    };
    let entries = parse_records(
        r#"[
            {"name": "Cum Snail", "type": "mythical", "info": "First.", "image": "penis.png"},
            {"name": "cum snail", "type": "magic", "info": "Second.", "image": "penis.png"}
        ]"#,
    )
    .unwrap();

    for jobs in [1, 2] {
        let dir = tempfile::tempdir().unwrap();
        let options = BatchOptions {
            output_dir: dir.path().to_path_buf(),
            jobs,
            dump_layout: false,
        };
        let report = render_batch(&entries, ctx, &options);
        let exported: Vec<_> = report.exported().map(|(name, _)| name).collect();
        assert_eq!(exported, ["Cum Snail"], "jobs = {jobs}");
        let failures: Vec<_> = report.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, "cum snail");
        assert!(failures[0].1.contains("cum_snail.png"), "{}", failures[0].1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
