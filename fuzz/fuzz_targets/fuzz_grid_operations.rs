#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tessel_layout::{
    Direction, GridConfig, GridOperation, GridState, GridTimeline, Location, leaves,
};

#[derive(Debug, Arbitrary)]
enum FuzzDirection {
    Up,
    Down,
    Left,
    Right,
}

impl From<FuzzDirection> for Direction {
    fn from(value: FuzzDirection) -> Self {
        match value {
            FuzzDirection::Up => Self::Up,
            FuzzDirection::Down => Self::Down,
            FuzzDirection::Left => Self::Left,
            FuzzDirection::Right => Self::Right,
        }
    }
}

#[derive(Debug, Arbitrary)]
enum FuzzOp {
    Add { target: u8, direction: FuzzDirection },
    Remove { target: u8 },
    Move { from: u8, to: u8, direction: FuzzDirection },
    Resize { target: u8, size: u8 },
    Maximize { target: u8, on: bool },
    RawRemove { path: Vec<u8> },
    Normalize,
}

fn leaf_location(grid: &GridState, pick: u8) -> Location {
    let all = leaves(grid);
    if all.is_empty() {
        return Vec::new();
    }
    all[usize::from(pick) % all.len()].0.clone()
}

fuzz_target!(|ops: Vec<FuzzOp>| {
    let mut grid = GridState::new("g0");
    let mut timeline = GridTimeline::with_baseline(&grid, GridConfig::default());
    let mut next_id = 1usize;

    for op in ops.into_iter().take(64) {
        let operation = match op {
            FuzzOp::Add { target, direction } => {
                let group_id = format!("g{next_id}");
                next_id += 1;
                GridOperation::AddView {
                    group_id,
                    location: leaf_location(&grid, target),
                    direction: direction.into(),
                    size: None,
                }
            }
            FuzzOp::Remove { target } => GridOperation::RemoveView {
                location: leaf_location(&grid, target),
            },
            FuzzOp::Move {
                from,
                to,
                direction,
            } => GridOperation::MoveView {
                from: leaf_location(&grid, from),
                to: leaf_location(&grid, to),
                direction: direction.into(),
            },
            FuzzOp::Resize { target, size } => GridOperation::ResizeView {
                location: leaf_location(&grid, target),
                size: f64::from(size),
            },
            FuzzOp::Maximize { target, on } => GridOperation::SetMaximized {
                location: leaf_location(&grid, target),
                maximized: on,
            },
            FuzzOp::RawRemove { path } => GridOperation::RemoveView {
                location: path.into_iter().take(8).map(usize::from).collect(),
            },
            FuzzOp::Normalize => GridOperation::Normalize,
        };

        if let Ok(next) = timeline.apply_and_record(&grid, operation) {
            grid = next;
        }
        let report = grid.invariant_report();
        assert!(!report.has_errors(), "invariants broken: {:?}", report.issues);
    }

    let replayed = timeline.replay().expect("replay recorded operations");
    assert_eq!(replayed.state_hash(), grid.state_hash());
});
