#![no_main]

use libfuzzer_sys::fuzz_target;
use tessel_layout::{deserialize_grid, leaf_count, serialize_grid_to_value};

fuzz_target!(|data: &[u8]| {
    let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let Some(grid) = deserialize_grid(&value, None) else {
        return;
    };

    // Anything that loads must survive a save/load cycle unchanged.
    let saved = serialize_grid_to_value(&grid).expect("serialize loaded grid");
    let reloaded = deserialize_grid(&saved, None).expect("reload saved grid");
    assert_eq!(reloaded.state_hash(), grid.state_hash());
    assert_eq!(leaf_count(&reloaded), leaf_count(&grid));
});
