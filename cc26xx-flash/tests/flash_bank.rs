use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use cc26xx_flash::flashing::{
    AlgorithmRegistry, DeviceType, EraseState, FlashBank, FlashError, FlashProgress,
    ProgressEvent,
};
use cc26xx_flash::test::{FakeClock, HelperBehavior, MockEvent, MockTarget, HELPERS};
use cc26xx_flash::KeepAlive;
use cc26xx_target::Family;
use pretty_assertions::assert_eq;

const ERASE_ALL: u32 = 1;
const PROGRAM: u32 = 2;
const ERASE_AND_PROGRAM: u32 = 3;

const AGAMA_STATUS: [u64; 2] = [0x2000_1fe4, 0x2000_1ff8];

fn bank(target: MockTarget) -> FlashBank<MockTarget> {
    let mut registry = AlgorithmRegistry::new();
    registry
        .add_from_yaml(HELPERS)
        .expect("Failed to load the test helpers.");

    FlashBank::new(target, registry)
}

fn states(bank: &FlashBank<MockTarget>) -> Vec<EraseState> {
    bank.sectors()
        .iter()
        .map(|sector| sector.erase_state)
        .collect()
}

/// The helper was halted and released exactly once, and joined at most once.
fn assert_stopped_once(target: &MockTarget) {
    let count = |wanted: fn(&MockEvent) -> bool| {
        target.events().iter().filter(|event| wanted(event)).count()
    };

    assert_eq!(target.halts(), 1, "halts");
    assert_eq!(count(|e| matches!(e, MockEvent::Free { .. })), 1, "frees");
    assert!(count(|e| matches!(e, MockEvent::Wait)) <= 1, "joins");
}

#[test]
fn unknown_device_probes_as_agama() {
    let mut bank = bank(MockTarget::new(0xb990_0477, 0, 2, 0x80));

    let profile = bank.probe().expect("Failed to probe.").clone();

    assert_eq!(profile.family, Family::Agama);
    assert_eq!(profile.device_type, DeviceType::Cc26x2);
    assert_eq!(profile.sector_length, 0x2000);
    assert_eq!(profile.sram_size, 0x10000);
    assert_eq!(bank.sectors().len(), 128);
    assert!(bank
        .sectors()
        .iter()
        .all(|sector| sector.size == 0x2000 && sector.erase_state == EraseState::Unknown));
}

#[test]
fn single_sector_write_uses_first_slot_only() {
    let mut bank = bank(MockTarget::agama());
    let layout = Family::Agama.layout();
    let data: Vec<u8> = (0..0x2000u32).map(|i| i as u8).collect();

    bank.write(&data, 0).expect("Failed to write.");

    let target = bank.target();
    assert_eq!(target.executed(), vec![(0, PROGRAM, 0, 0x2000)]);
    assert!(!target.events().contains(&MockEvent::Write {
        address: layout.params[1],
        length: 20
    }));
    // One wait for the idle slot, one trailing wait for the command itself.
    assert_eq!(target.reads_of(layout.status[1]), 1);
    assert_eq!(target.reads_of(layout.status[0]), 1);
    assert_eq!(&target.flash()[..0x2000], &data[..]);
    assert_stopped_once(target);
}

#[test]
fn write_alternates_slots_and_marks_overlapping_sectors() {
    let mut bank = bank(MockTarget::agama());
    let data = vec![0x5a; 5 * 0x2000 + 0x10];

    bank.write(&data, 0x4000).expect("Failed to write.");

    let executed = bank.target().executed();
    let slots: Vec<usize> = executed.iter().map(|(slot, ..)| *slot).collect();
    assert_eq!(slots, vec![0, 1, 0, 1, 0, 1]);
    assert_eq!(
        executed.last(),
        Some(&(1, PROGRAM, 0x4000 + 5 * 0x2000, 0x10))
    );

    let flash = bank.target().flash();
    assert_eq!(&flash[0x4000..0x4000 + data.len()], &data[..]);
    assert!(flash[..0x4000].iter().all(|byte| *byte == 0xff));

    let states = states(&bank);
    assert!(states[..2].iter().all(|s| *s == EraseState::Unknown));
    assert!(states[2..=7].iter().all(|s| *s == EraseState::NotErased));
    assert!(states[8..].iter().all(|s| *s == EraseState::Unknown));

    let mut readback = vec![0; data.len()];
    bank.read(0x4000, &mut readback).expect("Failed to read.");
    assert_eq!(readback, data);
}

#[test]
fn unaligned_write_marks_the_tail_sector() {
    let mut bank = bank(MockTarget::chameleon());

    bank.write(&[0; 0x1000], 0x1800).expect("Failed to write.");

    let executed = bank.target().executed();
    assert_eq!(executed, vec![(0, PROGRAM, 0x1800, 0x1000)]);
    assert_eq!(
        states(&bank)[..4],
        [
            EraseState::Unknown,
            EraseState::NotErased,
            EraseState::NotErased,
            EraseState::Unknown
        ]
    );
}

#[test]
fn chameleon_write_uses_chameleon_buffers() {
    let mut bank = bank(MockTarget::chameleon());

    bank.write(&[0x11; 0x1800], 0).expect("Failed to write.");

    let target = bank.target();
    assert_eq!(
        target.executed(),
        vec![(0, PROGRAM, 0, 0x1000), (1, PROGRAM, 0x1000, 0x800)]
    );
    assert!(target.events().contains(&MockEvent::Write {
        address: 0x2000_1c00,
        length: 0x1000
    }));
    assert!(target.events().contains(&MockEvent::Write {
        address: 0x2000_2c00,
        length: 0x800
    }));
    assert!(target.events().contains(&MockEvent::Allocate { size: 0x3c00 }));
}

#[test]
fn erase_marks_only_requested_sectors() {
    let mut target = MockTarget::agama();
    target.set_flash(0, &[0; 8 * 0x2000]);
    let mut bank = bank(target);

    bank.erase(2, 5).expect("Failed to erase.");

    let executed = bank.target().executed();
    assert_eq!(
        executed,
        vec![
            (0, ERASE_AND_PROGRAM, 0x4000, 4),
            (1, ERASE_AND_PROGRAM, 0x6000, 4),
            (0, ERASE_AND_PROGRAM, 0x8000, 4),
            (1, ERASE_AND_PROGRAM, 0xa000, 4),
        ]
    );

    let flash = bank.target().flash();
    assert!(flash[0x2000..0x4000].iter().all(|byte| *byte == 0));
    assert!(flash[0x4000..0xc000].iter().all(|byte| *byte == 0xff));
    assert!(flash[0xc000..0xe000].iter().all(|byte| *byte == 0));

    let states = states(&bank);
    assert!(states[2..=5].iter().all(|s| *s == EraseState::Erased));
    assert_eq!(states[1], EraseState::Unknown);
    assert_eq!(states[6], EraseState::Unknown);
    assert_stopped_once(bank.target());
}

#[test]
fn single_sector_erase_preloads_one_buffer() {
    let mut bank = bank(MockTarget::agama());
    let layout = Family::Agama.layout();

    bank.erase(7, 7).expect("Failed to erase.");

    let writes: Vec<u64> = bank
        .target()
        .events()
        .iter()
        .filter_map(|event| match event {
            MockEvent::Write { address, .. } if *address != layout.load_address => Some(*address),
            _ => None,
        })
        .collect();
    assert_eq!(writes, vec![layout.buffers[0], layout.params[0]]);
}

#[test]
fn full_range_erase_is_a_mass_erase() {
    let mut target = MockTarget::agama();
    target.set_flash(0x1234, &[0; 0x100]);
    let mut bank = bank(target);

    bank.erase(0, 127).expect("Failed to erase.");

    assert_eq!(bank.target().executed(), vec![(0, ERASE_ALL, 0, 4)]);
    assert!(bank.target().flash().iter().all(|byte| *byte == 0xff));
    assert!(states(&bank).iter().all(|s| *s == EraseState::Erased));
    assert_stopped_once(bank.target());

    let mut other = self::bank(MockTarget::agama());
    other.mass_erase().expect("Failed to mass erase.");
    assert_eq!(other.target().executed(), bank.target().executed());
    assert_eq!(states(&other), states(&bank));
}

#[test]
fn failed_erase_leaves_sector_table_alone() {
    let mut target = MockTarget::agama();
    target.set_helper(HelperBehavior::Fail {
        after: 1,
        status: 0x0000_0002,
    });
    let mut bank = bank(target);
    bank.erase(0, 0).expect("Failed to erase.");
    bank.target_mut().clear_events();

    let error = bank.erase(1, 3).unwrap_err();

    assert!(matches!(
        error,
        FlashError::AlgorithmFailed {
            family: "CC26x2",
            status: 2
        }
    ));
    let states = states(&bank);
    assert_eq!(states[0], EraseState::Erased);
    assert!(states[1..].iter().all(|s| *s == EraseState::Unknown));
    assert!(!bank.is_algorithm_running());
    assert_stopped_once(bank.target());
}

#[test]
fn stuck_helper_times_out() {
    let mut target = MockTarget::agama();
    target.set_helper(HelperBehavior::Hang { after: 0 });
    let clock = FakeClock::new(Duration::from_millis(100));
    let mut bank = bank(target).with_clock(clock.clone());

    let error = bank.write(&[0; 0x100], 0).unwrap_err();

    assert!(matches!(
        error,
        FlashError::Timeout {
            family: "CC26x2",
            timeout
        } if timeout == Duration::from_millis(8000)
    ));
    assert!(clock.elapsed() > Duration::from_millis(8000));
    // The poll at exactly 8000 ms keeps waiting, the one at 8100 ms gives up.
    assert_eq!(bank.target().reads_of(AGAMA_STATUS[0]), 81);
    assert!(states(&bank).iter().all(|s| *s == EraseState::Unknown));

    let lifecycle = bank.target().lifecycle();
    assert_eq!(
        lifecycle[lifecycle.len() - 3..],
        [
            MockEvent::Halt,
            MockEvent::Wait,
            MockEvent::Free {
                address: 0x2000_0000
            }
        ]
    );
    assert_stopped_once(bank.target());
}

#[test]
fn slow_helper_keeps_session_alive() {
    let mut target = MockTarget::agama();
    target.set_helper(HelperBehavior::Hang { after: 0 });
    let clock = FakeClock::new(Duration::from_millis(100));
    let beats = Rc::new(RefCell::new(0));
    let counter = beats.clone();
    let mut bank = bank(target)
        .with_clock(clock.clone())
        .with_keep_alive(KeepAlive::new(move || *counter.borrow_mut() += 1));

    assert!(matches!(bank.mass_erase(), Err(FlashError::Timeout { .. })));

    // Polls at 600 ms through 8100 ms signal, the one at 500 ms does not.
    assert_eq!(*beats.borrow(), 76);
    assert_eq!(bank.target().reads_of(AGAMA_STATUS[0]), 81);
    assert_eq!(clock.elapsed(), Duration::from_millis(8200));
}

#[test]
fn busy_slots_are_polled_until_released() {
    let mut target = MockTarget::agama();
    target.set_helper(HelperBehavior::Delay { polls: 3 });
    let mut bank = bank(target).with_clock(FakeClock::new(Duration::from_millis(1)));
    let data: Vec<u8> = (0..0x4000).map(|i| (i % 253) as u8).collect();

    bank.write(&data, 0).expect("Failed to write.");

    let mut contents = vec![0; data.len()];
    bank.read(0, &mut contents).expect("Failed to read.");
    assert_eq!(contents, data);

    // Slot 1 starts out idle, then both slots stay busy for three polls.
    assert_eq!(bank.target().reads_of(AGAMA_STATUS[0]), 4);
    assert_eq!(bank.target().reads_of(AGAMA_STATUS[1]), 1 + 4);
    assert_stopped_once(bank.target());
}

#[test]
fn fast_helper_sends_no_keep_alive() {
    let beats = Rc::new(RefCell::new(0));
    let counter = beats.clone();
    let mut bank = bank(MockTarget::agama())
        .with_clock(FakeClock::new(Duration::from_millis(1)))
        .with_keep_alive(KeepAlive::new(move || *counter.borrow_mut() += 1));

    bank.erase(0, 3).expect("Failed to erase.");
    bank.write(&[0; 0x4000], 0).expect("Failed to write.");

    assert_eq!(*beats.borrow(), 0);
}

#[test]
fn running_core_is_rejected() {
    let mut target = MockTarget::agama();
    target.resume();
    let mut bank = bank(target);

    assert!(matches!(bank.erase(0, 1), Err(FlashError::NotHalted)));
    assert!(matches!(bank.mass_erase(), Err(FlashError::NotHalted)));
    assert!(matches!(bank.write(&[0; 4], 0), Err(FlashError::NotHalted)));
    assert!(bank.target().lifecycle().is_empty());
}

#[test]
fn misplaced_working_area_is_released() {
    let mut target = MockTarget::agama();
    target.misplace_working_area(0x2000_0400);
    let mut bank = bank(target);

    let error = bank.erase(0, 1).unwrap_err();

    assert!(error.is_resource_unavailable());
    assert!(matches!(
        error,
        FlashError::WorkingAreaMisplaced {
            expected: 0x2000_0000,
            actual: 0x2000_0400
        }
    ));
    assert!(bank.target().executed().is_empty());
    assert!(!bank
        .target()
        .events()
        .iter()
        .any(|event| matches!(event, MockEvent::Start { .. })));
    assert!(!bank.is_algorithm_running());
    assert_stopped_once(bank.target());
}

#[test]
fn refused_working_area_is_resource_unavailable() {
    let mut target = MockTarget::chameleon();
    target.refuse_working_area();
    let mut bank = bank(target);

    let error = bank.write(&[0; 16], 0).unwrap_err();

    assert!(matches!(
        error,
        FlashError::WorkingAreaAllocation { size: 0x3c00, .. }
    ));
    assert!(error.is_resource_unavailable());
    assert_eq!(bank.target().halts(), 1);
}

#[test]
fn failing_status_read_stops_the_helper() {
    let layout = Family::Agama.layout();
    let mut target = MockTarget::agama();
    target.fail_reads_at(layout.status[1]);
    let mut bank = bank(target);

    let error = bank.write(&[0; 0x100], 0).unwrap_err();

    assert!(matches!(error, FlashError::Memory(_)));
    assert_stopped_once(bank.target());
}

#[test]
fn empty_write_does_nothing() {
    let mut bank = bank(MockTarget::agama());

    bank.write(&[], 0x1000).expect("Failed to write.");

    assert!(bank.target().lifecycle().is_empty());
    assert!(states(&bank).iter().all(|s| *s == EraseState::Unknown));
}

#[test]
fn ranges_are_validated() {
    let mut bank = bank(MockTarget::chameleon());

    assert!(matches!(
        bank.erase(5, 4),
        Err(FlashError::InvalidSectorRange {
            first: 5,
            last: 4,
            count: 32
        })
    ));
    assert!(matches!(
        bank.erase(0, 32),
        Err(FlashError::InvalidSectorRange { .. })
    ));
    assert!(matches!(
        bank.write(&[0; 2], 0x1ffff),
        Err(FlashError::OutOfBounds {
            offset: 0x1ffff,
            end: 0x20001,
            size: 0x20000
        })
    ));
    assert!(bank.target().lifecycle().is_empty());
}

#[test]
fn erase_check_reads_sector_contents() {
    let mut target = MockTarget::chameleon();
    target.set_flash(0x3004, &[0x7f]);
    let mut bank = bank(target);

    bank.erase_check().expect("Failed to check.");

    let states = states(&bank);
    assert_eq!(states[3], EraseState::NotErased);
    assert_eq!(
        states.iter().filter(|s| **s == EraseState::Erased).count(),
        31
    );
}

#[test]
fn progress_is_reported() {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = events.clone();
    let mut bank = bank(MockTarget::agama())
        .with_progress(FlashProgress::new(move |event| sink.borrow_mut().push(event)));

    bank.erase(1, 2).expect("Failed to erase.");
    bank.write(&[0; 0x2100], 0x2000).expect("Failed to write.");

    assert_eq!(
        *events.borrow(),
        vec![
            ProgressEvent::StartedErasing { sectors: 2 },
            ProgressEvent::SectorErased {
                address: 0x2000,
                size: 0x2000
            },
            ProgressEvent::SectorErased {
                address: 0x4000,
                size: 0x2000
            },
            ProgressEvent::FinishedErasing,
            ProgressEvent::StartedProgramming { length: 0x2100 },
            ProgressEvent::PageProgrammed {
                address: 0x2000,
                size: 0x2000
            },
            ProgressEvent::PageProgrammed {
                address: 0x4000,
                size: 0x100
            },
            ProgressEvent::FinishedProgramming,
        ]
    );
}
