#![no_main]
use blockfit::{BlockList, Policy};
use libfuzzer_sys::{arbitrary::{Arbitrary, Unstructured}, fuzz_target};

#[derive(Debug, Arbitrary)]
enum PoolOp {
    Allocate { pid: u8, units: u8 },
    Deallocate { pid: u8 },
    Coalesce,
    FragmentCount,
}

// Random operation sequences must never break the block partition
fuzz_target!(|input: &[u8]| {
    let mut u = Unstructured::new(input);

    let total: u16 = match u.arbitrary() {
        Ok(t) => t,
        Err(_) => return,
    };
    let best_fit: bool = u.arbitrary().unwrap_or(false);
    let ops: Vec<PoolOp> = match u.arbitrary() {
        Ok(ops) => ops,
        Err(_) => return,
    };

    let policy = if best_fit { Policy::BestFit } else { Policy::FirstFit };
    let mut pool = match BlockList::new(total as usize, policy) {
        Ok(pool) => pool,
        Err(_) => return,
    };

    for op in ops.iter().take(256) {
        match *op {
            PoolOp::Allocate { pid, units } => {
                let _ = pool.allocate(pid as u32, units as usize);
            }
            PoolOp::Deallocate { pid } => {
                let _ = pool.deallocate(pid as u32);
            }
            PoolOp::Coalesce => pool.coalesce(),
            PoolOp::FragmentCount => {
                let _ = pool.fragment_count();
            }
        }

        if let Err(e) = pool.check_invariants() {
            panic!("{}\n{}", e, pool);
        }
    }
});
