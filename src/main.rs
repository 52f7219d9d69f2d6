//! Swapvault - Binary Entry Point
//!
//! Walks one native atomic swap end to end against an in-memory ledger.
//! Useful as a smoke check and as a minimal usage example.

use alloy_primitives::{Address, B256, U256};

use swapvault::external::{Hasher, InMemoryLedger, ManualClock, NoProxies, Sha256Hasher};
use swapvault::{LockId, SwapEngine, Token};

fn main() {
    println!("===========================================");
    println!("  Swapvault - hash-timelock escrow engine");
    println!("===========================================");
    println!();

    let vault = Address::repeat_byte(0xee);
    let alice = Address::repeat_byte(0xaa);
    let bob = Address::repeat_byte(0xbb);
    let asset = B256::repeat_byte(0xa1);

    let mut engine = SwapEngine::new(
        vault,
        ManualClock::new(0),
        Sha256Hasher,
        InMemoryLedger::new(vault),
        NoProxies,
    );

    let secret = b"the preimage alice generated";
    let hashed = Sha256Hasher.hash(secret);
    println!("Secret hash: {hashed}");
    println!();

    // Alice locks 100 native units for Bob, refundable from t=1000.
    let buy_id = engine
        .lock_buy(
            alice,
            Token::Native,
            bob,
            hashed,
            1_000,
            asset,
            U256::from(1u64),
            U256::from(100u64),
        )
        .expect("buy lock");
    println!("Alice locked 100 under {buy_id}");

    // Bob stashes liquidity, then answers with a shorter-lived sell lock.
    engine
        .deposit_stash(bob, Token::Native, asset, U256::from(200u64))
        .expect("deposit");
    let sell_id = engine
        .lock_sell(bob, Token::Native, alice, hashed, 900, asset, U256::from(50u64), buy_id)
        .expect("sell lock");
    println!("Bob answered with 50 from his stash under {sell_id}");

    // Alice claims Bob's lock, revealing the secret on the event log.
    engine.clock().set(500);
    engine
        .unlock_by_recipient(alice, Token::Native, bob, secret, 900)
        .expect("alice unlock");

    // Bob reads the revealed secret and claims Alice's lock.
    let revealed: Vec<u8> = engine
        .events()
        .iter()
        .find_map(|e| match e {
            swapvault::Event::UnlockByRecipient { secret, .. } => Some(secret.clone()),
            _ => None,
        })
        .expect("revealed secret");
    engine.clock().set(950);
    engine
        .unlock_by_recipient(bob, Token::Native, alice, &revealed, 1_000)
        .expect("bob unlock");

    println!();
    println!("Post-swap state:");
    println!("  Alice received:   {}", engine.ledger().native_paid(alice));
    println!("  Bob received:     {}", engine.ledger().native_paid(bob));
    println!(
        "  Bob's stash:      {}",
        engine.stash_value(Token::Native, asset, bob)
    );
    println!("  Live locks:       {}", engine.locks().len());
    println!(
        "  Revealed secret:  0x{}",
        hex::encode(&revealed)
    );
    println!();

    println!("Event log:");
    for event in engine.events() {
        let lock = event
            .lock_id()
            .map(|id: LockId| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {:<20} {}", event.kind(), lock);
    }
}
