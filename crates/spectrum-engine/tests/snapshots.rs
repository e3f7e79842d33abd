//! Snapshot loading through the engine context.

use emu_core::testing::ScriptedCpu;
use format_z80::rle;
use spectrum_engine::{EngineConfig, EngineContext, EngineError, ROM_SIZE, SnapshotFormat};

fn make_context() -> EngineContext<ScriptedCpu> {
    EngineContext::new(ScriptedCpu::new(4), &[0u8; ROM_SIZE], EngineConfig::default())
        .expect("ROM size is valid")
}

fn z80_header(pc: u16, sp: u16, flags: u8) -> Vec<u8> {
    let mut header = vec![0u8; 30];
    header[6..8].copy_from_slice(&pc.to_le_bytes());
    header[8..10].copy_from_slice(&sp.to_le_bytes());
    header[12] = flags;
    header[27] = 1;
    header[28] = 1;
    header[29] = 1;
    header
}

fn page(id: u8, fill: u8) -> Vec<u8> {
    let packed = rle::compress(&[fill; 0x4000]);
    let len = u16::try_from(packed.len()).expect("packed page fits a u16");
    let mut out = len.to_le_bytes().to_vec();
    out.push(id);
    out.extend_from_slice(&packed);
    out
}

#[test]
fn compressed_v1_stops_at_end_marker() {
    let ram: Vec<u8> = (0..0xC000u32).map(|i| (i / 256) as u8).collect();
    let mut data = z80_header(0x8000, 0xF000, 0x20 | (5 << 1));
    data.extend_from_slice(&rle::compress(&ram));
    data.extend_from_slice(&[0xED, 0xED, 0x00, 0x00]);
    data.extend_from_slice(&[0xAA; 16]);

    let mut ctx = make_context();
    ctx.load_snapshot(SnapshotFormat::Z80, &data)
        .expect("Z80 should load");

    let spec = ctx.spectrum();
    assert_eq!(spec.registers().pc.word(), 0x8000);
    assert_eq!(spec.bus().border(), 5);
    assert!(spec.registers().iff1);
    assert_eq!(spec.bus().memory.ram(), &ram[..]);
}

#[test]
fn v3_with_foreign_hardware_and_unknown_page_still_loads() {
    let mut data = z80_header(0, 0xFF00, 0);
    data.extend_from_slice(&54u16.to_le_bytes());
    let mut ext = [0u8; 54];
    ext[..2].copy_from_slice(&0x5B00u16.to_le_bytes());
    ext[2] = 4; // a 128K mode
    data.extend_from_slice(&ext);
    data.extend(page(8, 0x11));
    data.extend(page(3, 0x99));
    data.extend(page(4, 0x22));
    data.extend(page(5, 0x33));

    let mut ctx = make_context();
    ctx.load_snapshot(SnapshotFormat::Z80, &data)
        .expect("Z80 should load");

    let spec = ctx.spectrum();
    assert_eq!(spec.registers().pc.word(), 0x5B00);
    assert_eq!(spec.peek(0x4000), 0x11);
    assert_eq!(spec.peek(0x8000), 0x22);
    assert_eq!(spec.peek(0xC000), 0x33);
    assert_eq!(ctx.last_error(), None);
}

#[test]
fn truncated_run_is_a_format_error_and_machine_is_untouched() {
    let mut data = z80_header(0x8000, 0xF000, 0x20);
    data.extend_from_slice(&[0x01, 0x02, 0xED, 0xED, 0x05]);

    let mut ctx = make_context();
    ctx.spectrum_mut().registers_mut().pc.set_word(0x4242);

    let result = ctx.load_snapshot(SnapshotFormat::Z80, &data);

    let Err(err) = result else {
        panic!("truncated run should fail");
    };
    assert!(matches!(err, EngineError::Z80(_)));
    assert!(err.is_format_error());
    assert_eq!(ctx.spectrum().registers().pc.word(), 0x4242);
    assert!(ctx.last_error().is_some());
}

#[test]
fn sna_loaded_machine_keeps_running() {
    let mut image = vec![0u8; 49_179];
    image[23..25].copy_from_slice(&0xC000u16.to_le_bytes());
    image[27 + 0x8000..27 + 0x8002].copy_from_slice(&0x6000u16.to_le_bytes());

    let mut ctx = make_context();
    ctx.load_snapshot(SnapshotFormat::Sna, &image)
        .expect("SNA should load");
    assert_eq!(ctx.spectrum().registers().pc.word(), 0x6000);
    assert_eq!(ctx.spectrum().registers().sp.word(), 0xC002);

    let report = ctx.run_frame().expect("frame should run");
    assert_eq!(report.cycles, 69_888);
}
