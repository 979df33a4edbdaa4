//! Interrupt line probing against the simulated target

mod common;

use common::SimulatedTarget;
use vexcept_core::prober::{probe_interrupt_lines, probe_line};
use vexcept_core::scratch::ScratchLayout;
use vexcept_core::session::ProbeSession;

fn unmasked(lines: u16) -> (SimulatedTarget, ScratchLayout)
{
    let mut target = SimulatedTarget::new(lines, 16);
    let layout = ScratchLayout::default();
    target.halt().unwrap();
    target.set_interrupt_masking(false).unwrap();
    layout.install(&mut target).unwrap();
    (target, layout)
}

#[test]
fn test_counts_consecutive_lines()
{
    let (mut target, layout) = unmasked(40);
    assert_eq!(probe_interrupt_lines(&mut target, &layout).unwrap(), 40);
}

#[test]
fn test_stops_at_first_gap()
{
    let (mut target, layout) = unmasked(64);
    target.remove_line(7);
    assert_eq!(probe_interrupt_lines(&mut target, &layout).unwrap(), 7);
}

#[test]
fn test_no_external_lines()
{
    let (mut target, layout) = unmasked(0);
    target.add_line(3);
    assert_eq!(probe_interrupt_lines(&mut target, &layout).unwrap(), 0);
}

#[test]
fn test_full_nvic()
{
    let (mut target, layout) = unmasked(496);
    assert_eq!(probe_interrupt_lines(&mut target, &layout).unwrap(), 496);
    assert_eq!(target.resets, 496);
}

#[test]
fn test_masked_interrupts_are_not_counted()
{
    let mut target = SimulatedTarget::new(8, 16);
    let layout = ScratchLayout::default();
    layout.install(&mut target).unwrap();
    assert!(!probe_line(&mut target, 0, &layout).unwrap());
}

#[test]
fn test_unreadable_psr_counts_as_absent()
{
    let (mut target, layout) = unmasked(8);
    target.fail_register_reads = true;
    assert!(!probe_line(&mut target, 0, &layout).unwrap());
}

#[test]
fn test_probe_line_rejects_out_of_range_line()
{
    let (mut target, layout) = unmasked(8);
    assert!(probe_line(&mut target, 496, &layout).is_err());
}
