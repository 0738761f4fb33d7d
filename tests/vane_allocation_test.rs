//! Vane sweeps run at the wind period for the life of the process, so once
//! warmed up they must not touch the heap.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;

use sailsense::hardware::{AnalogConverter, AnalogMultiplexer};

struct CountingAllocator;

thread_local! {
    static ALLOCATIONS: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATIONS.try_with(|n| n.set(n.get() + 1));
        unsafe { System.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) }
    }
}

#[global_allocator]
static ALLOCATOR: CountingAllocator = CountingAllocator;

fn allocations() -> usize {
    ALLOCATIONS.with(|n| n.get())
}

/// Converter returning a fixed voltage per channel without recording reads
struct FixedAdc;

impl AnalogConverter for FixedAdc {
    fn read_channel(
        &mut self,
        channel: u8,
        _gain: u16,
        _sample_rate: u16,
    ) -> sailsense::Result<f64> {
        Ok(2.0 + f64::from(channel))
    }
}

#[test]
fn test_vane_sweep_does_not_allocate() {
    let mut mux = AnalogMultiplexer::new(Box::new(FixedAdc), 4096, 250);
    let mut sin_sum = 0.0;

    let before = allocations();
    for _ in 0..100 {
        match mux.read_channels([0, 1]) {
            Ok([sin, cos]) => {
                sin_sum += sin;
                assert_eq!(cos, 3.0);
            }
            Err(e) => panic!("sweep failed: {}", e),
        }
    }
    let after = allocations();

    assert_eq!(after - before, 0);
    assert_eq!(sin_sum, 200.0);
}
