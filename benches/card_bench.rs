use std::io::Cursor;

use cardforge::rendering::raster::CoverResize;
use cardforge::rendering::text::{FontConfig, FontRegistry, Weight};
use cardforge::rendering::wrap::wrap;
use cardforge::{compose, CardFace, CardKind, CornerStyle};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_wrap(c: &mut Criterion) {
    let fonts = FontRegistry::register(&FontConfig::default()).fonts;
    let text = "A small lizard wreathed in flame that scorches every adjacent creature. ".repeat(5);

    c.bench_function("wrap_description", |b| {
        b.iter(|| {
            wrap(
                black_box(&text),
                |s| fonts.measure(Weight::Regular, 18.0, s),
                352.0,
                5,
            )
        })
    });
}

fn bench_compose(c: &mut Criterion) {
    let fonts = FontRegistry::register(&FontConfig::default()).fonts;
    let photo = image::RgbaImage::from_fn(1024, 768, |x, y| image::Rgba([(x % 256) as u8, (y % 256) as u8, 80, 255]));
    let mut png = Cursor::new(Vec::new());
    photo.write_to(&mut png, image::ImageFormat::Png).unwrap();
    let face = CardFace {
        title: "Flame Lizard".to_string(),
        kind: CardKind::from_parts("Creature", Some(4), Some(5)),
        cost: 3,
        description: "Breathes fire on anything that moves.".to_string(),
        frame_color: "#aa2222".to_string(),
        creator: Some("Bob".to_string()),
    };

    c.bench_function("compose_card", |b| {
        b.iter(|| compose(black_box(png.get_ref()), &face, &fonts, &CoverResize, CornerStyle::Diagonal).unwrap())
    });
}

criterion_group!(benches, bench_wrap, bench_compose);
criterion_main!(benches);
