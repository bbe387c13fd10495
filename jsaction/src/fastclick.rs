//! Synthesis of immediate clicks from touch sequences.
//!
//! Browsers historically delay the click that follows `touchend` by ~300 ms.
//! This machine recognizes a tap (`touchstart` then `touchend`, same element,
//! small movement, short duration), synthesizes a click right away, and then
//! swallows the emulated mouse cascade the browser fires afterwards.
//!
//! The machine is an explicit tagged state over an opaque node handle; all
//! DOM side effects (timer, synthetic event construction, stop/prevent) are
//! decided here but performed by the caller. `contract.rs` drives it with
//! `web_sys::Element` nodes; unit tests drive it with integers.

/// Expando brand on the synthesized click so the suppression sweep can
/// recognize it and let it pass.
pub(crate) const SYNTHETIC_BRAND: &str = "__jsafc";

/// How long after `touchstart` a sequence is abandoned as a long-press.
pub(crate) const TAP_TIMEOUT_MS: u64 = 400;

/// How long after a synthesized click emulated mouse events are suppressed.
const SUPPRESS_MOUSE_MS: f64 = 800.0;

/// Maximum Manhattan distance, in px, between related touch/mouse points.
const TAP_SLOP_PX: i32 = 4;

/// Tags on which taps are left to the browser entirely.
const NATIVE_TOUCH_TAGS: [&str; 4] = ["INPUT", "TEXTAREA", "SELECT", "OPTION"];

#[derive(Debug, Clone, PartialEq)]
enum State<N> {
    Idle,
    Pending { node: N, x: i32, y: i32 },
    Suppressing { node: N, x: i32, y: i32, since: f64 },
}

/// What the driver must do after feeding a `touchend` to the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TapOutcome {
    /// Not a tap end; resolution proceeds normally.
    None,
    /// The sequence ended without a tap; the pending timer must be cancelled.
    Reset,
    /// A tap completed: cancel the timer, synthesize a click at the recorded
    /// coordinates, and stop/prevent the raw `touchend`.
    Synthesize,
}

/// The kind of raw mouse event seen by the suppression sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MouseKind {
    Down,
    Up,
    Click,
}

#[derive(Debug)]
pub(crate) struct FastClick<N> {
    state: State<N>,
}

impl<N: Clone + PartialEq> FastClick<N> {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    /// Whether an element is eligible to start a tap sequence: it binds
    /// `click` without binding the raw touch types, and the touched target
    /// is not a control the browser handles natively.
    pub fn eligible(
        binds_click: bool,
        binds_touch: bool,
        target_tag: &str,
        multi_touch: bool,
    ) -> bool {
        binds_click
            && !binds_touch
            && !multi_touch
            && !NATIVE_TOUCH_TAGS.contains(&target_tag.to_ascii_uppercase().as_str())
    }

    /// Begins a sequence on `node`. Any prior sequence is abandoned. The
    /// driver must (re)start the tap timer.
    pub fn arm(&mut self, node: N, x: i32, y: i32) {
        self.state = State::Pending { node, x, y };
    }

    /// Tap timer fired: a press this long is not a tap.
    pub fn on_timeout(&mut self) {
        if matches!(self.state, State::Pending { .. }) {
            self.state = State::Idle;
        }
    }

    /// Feed a `touchmove`. Returns true when the sequence was abandoned and
    /// the driver must cancel the timer.
    pub fn on_touch_move(&mut self, x: i32, y: i32) -> bool {
        if let State::Pending { x: px, y: py, .. } = self.state {
            if manhattan(x, y, px, py) > TAP_SLOP_PX {
                self.state = State::Idle;
                return true;
            }
        }
        false
    }

    /// Feed a `touchend` observed on `node` (a visited element during
    /// resolution). Only the node recorded at `touchstart` can complete the
    /// tap.
    pub fn try_tap(
        &mut self,
        node: &N,
        x: i32,
        y: i32,
        default_prevented: bool,
        now: f64,
    ) -> TapOutcome {
        let State::Pending {
            node: pending,
            x: px,
            y: py,
        } = &self.state
        else {
            return TapOutcome::None;
        };
        if pending != node {
            return TapOutcome::None;
        }
        if !default_prevented && manhattan(x, y, *px, *py) <= TAP_SLOP_PX {
            self.state = State::Suppressing {
                node: node.clone(),
                x,
                y,
                since: now,
            };
            TapOutcome::Synthesize
        } else {
            self.state = State::Idle;
            TapOutcome::Reset
        }
    }

    /// A `touchend` whose resolution never reached the pending node ends the
    /// sequence. Returns true when a timer must be cancelled.
    pub fn reset_if_pending(&mut self) -> bool {
        if matches!(self.state, State::Pending { .. }) {
            self.state = State::Idle;
            true
        } else {
            false
        }
    }

    /// Enter suppression anchored at the given point, on request of an
    /// application handler that observed a `touchend` record.
    pub fn suppress_from(&mut self, node: N, x: i32, y: i32, now: f64) {
        self.state = State::Suppressing { node, x, y, since: now };
    }

    /// Feed a raw mouse event from the capture-phase sweep. Returns true when
    /// the event belongs to the emulated cascade and must be stopped.
    pub fn on_mouse(
        &mut self,
        kind: MouseKind,
        node: &N,
        x: i32,
        y: i32,
        now: f64,
        synthetic: bool,
    ) -> bool {
        let State::Suppressing {
            node: anchor,
            x: ax,
            y: ay,
            since,
        } = &self.state
        else {
            return false;
        };
        if synthetic {
            return false;
        }
        if now - since > SUPPRESS_MOUSE_MS
            || (anchor != node && manhattan(x, y, *ax, *ay) > TAP_SLOP_PX)
        {
            self.state = State::Idle;
            return false;
        }
        if kind == MouseKind::Click {
            self.state = State::Idle;
        }
        true
    }
}

fn manhattan(x1: i32, y1: i32, x2: i32, y2: i32) -> i32 {
    (x1 - x2).abs() + (y1 - y2).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_within_slop_synthesizes_once() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert_eq!(fc.try_tap(&7, 101, 101, false, 50.0), TapOutcome::Synthesize);
        // the machine is now suppressing, not pending
        assert!(!fc.reset_if_pending());
        assert_eq!(fc.try_tap(&7, 101, 101, false, 60.0), TapOutcome::None);
    }

    #[test]
    fn movement_beyond_slop_aborts() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert!(fc.on_touch_move(110, 110));
        assert_eq!(fc.try_tap(&7, 110, 110, false, 50.0), TapOutcome::None);
    }

    #[test]
    fn small_movement_keeps_the_sequence() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert!(!fc.on_touch_move(102, 101));
        assert_eq!(fc.try_tap(&7, 102, 101, false, 50.0), TapOutcome::Synthesize);
    }

    #[test]
    fn far_touchend_resets_and_propagates() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert_eq!(fc.try_tap(&7, 120, 100, false, 50.0), TapOutcome::Reset);
    }

    #[test]
    fn prevented_touchend_resets() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert_eq!(fc.try_tap(&7, 100, 100, true, 50.0), TapOutcome::Reset);
    }

    #[test]
    fn other_node_does_not_complete_the_tap() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        assert_eq!(fc.try_tap(&8, 100, 100, false, 50.0), TapOutcome::None);
        assert!(fc.reset_if_pending());
    }

    #[test]
    fn timeout_abandons_long_press() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.on_timeout();
        assert_eq!(fc.try_tap(&7, 100, 100, false, 500.0), TapOutcome::None);
    }

    #[test]
    fn new_touchstart_replaces_pending_sequence() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.arm(8u32, 200, 200);
        assert_eq!(fc.try_tap(&7, 100, 100, false, 50.0), TapOutcome::None);
        assert_eq!(fc.try_tap(&8, 200, 200, false, 50.0), TapOutcome::Synthesize);
    }

    #[test]
    fn cascade_near_the_tap_is_suppressed_until_click() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.try_tap(&7, 100, 100, false, 1000.0);
        assert!(fc.on_mouse(MouseKind::Down, &7, 100, 100, 1100.0, false));
        assert!(fc.on_mouse(MouseKind::Up, &7, 101, 100, 1150.0, false));
        assert!(fc.on_mouse(MouseKind::Click, &7, 100, 100, 1200.0, false));
        // the click closed the window
        assert!(!fc.on_mouse(MouseKind::Down, &7, 100, 100, 1250.0, false));
    }

    #[test]
    fn suppression_matches_by_coordinates_when_target_differs() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.try_tap(&7, 100, 100, false, 1000.0);
        assert!(fc.on_mouse(MouseKind::Down, &9, 102, 101, 1100.0, false));
    }

    #[test]
    fn the_synthetic_click_itself_passes() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.try_tap(&7, 100, 100, false, 1000.0);
        assert!(!fc.on_mouse(MouseKind::Click, &7, 100, 100, 1010.0, true));
        // and suppression survives it
        assert!(fc.on_mouse(MouseKind::Down, &7, 100, 100, 1020.0, false));
    }

    #[test]
    fn stale_or_distant_mouse_events_clear_suppression() {
        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.try_tap(&7, 100, 100, false, 1000.0);
        assert!(!fc.on_mouse(MouseKind::Down, &7, 100, 100, 2000.0, false));
        assert!(!fc.on_mouse(MouseKind::Down, &7, 100, 100, 2001.0, false));

        let mut fc = FastClick::new();
        fc.arm(7u32, 100, 100);
        fc.try_tap(&7, 100, 100, false, 1000.0);
        assert!(!fc.on_mouse(MouseKind::Down, &9, 300, 300, 1100.0, false));
    }

    #[test]
    fn eligibility_requires_click_without_touch_bindings() {
        assert!(FastClick::<u32>::eligible(true, false, "DIV", false));
        assert!(!FastClick::<u32>::eligible(false, false, "DIV", false));
        assert!(!FastClick::<u32>::eligible(true, true, "DIV", false));
        assert!(!FastClick::<u32>::eligible(true, false, "INPUT", false));
        assert!(!FastClick::<u32>::eligible(true, false, "textarea", false));
        assert!(!FastClick::<u32>::eligible(true, false, "DIV", true));
    }
}
