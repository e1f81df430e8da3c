use spectrum_client::render::{decode, ChartDimensions, Reconciler, ScaleConfig, ScaleParams};
use spectrum_client::{Error, WireMessage};

fn reconciler(width: u32, height: u32) -> Reconciler {
    Reconciler::new(ScaleConfig::new(
        ChartDimensions::new(width, height),
        ScaleParams::default(),
    ))
}

#[test]
fn test_three_bin_frame_layout() {
    let mut r = reconciler(300, 100);
    let frame = decode(&WireMessage::Binary(vec![0, 128, 255])).unwrap();
    r.reconcile(&frame);

    let geometry: Vec<(u32, u32, u32)> = r.bars().map(|b| (b.x, b.y, b.height)).collect();
    assert_eq!(geometry, vec![(0, 100, 0), (0, 94, 6), (1, 0, 100)]);
}

#[test]
fn test_variable_length_frames() {
    let mut r = reconciler(300, 100);
    r.reconcile(&decode(&WireMessage::Binary(vec![5, 6, 7])).unwrap());
    r.reconcile(&decode(&WireMessage::Binary(vec![8, 9])).unwrap());

    let indices: Vec<usize> = r.bars().map(|b| b.index).collect();
    assert_eq!(indices, vec![0, 1]);
}

#[test]
fn test_text_frame_leaves_bars_alone() {
    let mut r = reconciler(300, 100);
    r.reconcile(&decode(&WireMessage::Binary(vec![50, 100])).unwrap());
    let before: Vec<_> = r.bars().cloned().collect();

    match decode(&WireMessage::Text("[1,2,3]".to_string())) {
        Err(Error::MalformedFrame(_)) => {}
        other => panic!("expected MalformedFrame, got {:?}", other),
    }

    let after: Vec<_> = r.bars().cloned().collect();
    assert_eq!(before, after);
}

#[test]
fn test_full_width_spectrum() {
    let mut r = reconciler(1024, 256);
    let frame = decode(&WireMessage::Binary((0..=255u8).cycle().take(1024).collect())).unwrap();

    let report = r.reconcile(&frame);
    assert_eq!(report.created.len(), 1024);
    assert!(r.bars().all(|b| b.width == 1 && b.x as usize == b.index));
    assert!(r.bars().all(|b| b.y + b.height == 256));
}
