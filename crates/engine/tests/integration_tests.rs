//! End-to-end flows through the engine façade with a pinned clock and a
//! recording job queue.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use homeroom_engine::authz::RoleAuthorizer;
use homeroom_engine::services::{ItemDraft, StockDraft, UserDraft};
use homeroom_engine::testing::{ManualClock, RecordingQueue};
use homeroom_engine::{Engine, EngineError};
use homeroom_jobs::JobKind;
use homeroom_store::Store;
use homeroom_types::{
    Channel, ChannelState, EconomyConfig, Event, Role, User, VerificationCode,
};

/// Inside the default 09:00-15:00 market window
fn trading_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
}

/// After the default market close
fn after_hours() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 16, 0, 0).unwrap()
}

fn engine_at(now: DateTime<Utc>) -> (Engine, Arc<RecordingQueue>, Arc<ManualClock>) {
    let queue = Arc::new(RecordingQueue::new());
    let clock = Arc::new(ManualClock::at(now));
    let engine = Engine::new(
        Store::new(),
        EconomyConfig::default(),
        clock.clone(),
        Arc::new(RoleAuthorizer),
        queue.clone(),
    );
    (engine, queue, clock)
}

fn sign_up_teacher(engine: &mut Engine, username: &str) -> User {
    let code_value = format!("code-{username}");
    let id = engine.store_mut().next_id();
    engine.store_mut().insert_verification_code(VerificationCode {
        id,
        code: code_value.clone(),
        is_verified: false,
    });
    engine
        .sign_up(UserDraft {
            username: username.to_string(),
            nickname: username.to_string(),
            password: "pw1234".to_string(),
            role: Role::Teacher,
            verification_code: Some(code_value),
        })
        .unwrap()
}

fn sign_up_student(engine: &mut Engine, username: &str) -> User {
    engine
        .sign_up(UserDraft {
            username: username.to_string(),
            nickname: username.to_string(),
            password: "pw1234".to_string(),
            role: Role::Student,
            verification_code: None,
        })
        .unwrap()
}

fn classroom(engine: &mut Engine) -> (User, Channel) {
    let teacher = sign_up_teacher(engine, "teacher");
    let channel = engine.create_channel(teacher.id, "class 3-2").unwrap();
    (teacher, channel)
}

fn enroll(engine: &mut Engine, channel: &Channel, username: &str) -> User {
    let student = sign_up_student(engine, username);
    engine.join_channel(student.id, &channel.entry_code).unwrap();
    student
}

fn grant(engine: &mut Engine, teacher: &User, channel: &Channel, student: &User, point: u64) {
    engine
        .give_point_to_users(teacher.id, channel.id, &[student.id], point)
        .unwrap();
}

fn balance_of(engine: &Engine, channel: &Channel, student: &User) -> u64 {
    engine
        .store()
        .user_channels()
        .find(|uc| uc.channel == channel.id && uc.user == student.id)
        .map(|uc| uc.point)
        .unwrap()
}

fn stock_draft(price: u64, tax: f64) -> StockDraft {
    StockDraft {
        name: "juice co".to_string(),
        purchase_price: price,
        tax,
        standard: "attendance".to_string(),
        content: "rises with on-time arrivals".to_string(),
    }
}

fn item_draft(price: u64, amount: u64) -> ItemDraft {
    ItemDraft {
        title: "homework pass".to_string(),
        content: "skip one assignment".to_string(),
        image_url: "https://example.com/pass.png".to_string(),
        amount,
        price,
    }
}

// ============================================================================
// Trading
// ============================================================================

#[test]
fn test_grant_buy_sell_round_trip() {
    let (mut engine, _queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.10))
        .unwrap();

    grant(&mut engine, &teacher, &channel, &student, 100);
    assert_eq!(balance_of(&engine, &channel, &student), 100);

    clock.set(trading_hours());
    let (balance, held) = engine.buy_stock(student.id, channel.id, stock.id, 5).unwrap();
    assert_eq!(balance, 50);
    assert_eq!(held, 5);

    // gross 50, tax floor(50 * 0.10) = 5, net 45
    let (balance, held) = engine.sell_stock(student.id, channel.id, stock.id, 5).unwrap();
    assert_eq!(balance, 95);
    assert_eq!(held, 0);

    // the zeroed holding stays around
    assert!(engine
        .store()
        .user_stocks()
        .any(|us| us.user == student.id && us.stock == stock.id && us.total_stock_amount == 0));
    assert_eq!(engine.store().trade_infos().count(), 2);
}

#[test]
fn test_trading_outside_market_hours_is_rejected() {
    let (mut engine, _queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    assert_eq!(
        engine.buy_stock(student.id, channel.id, stock.id, 1),
        Err(EngineError::MarketClosed)
    );

    // the window is inclusive on both bounds
    clock.set(Utc.with_ymd_and_hms(2026, 3, 2, 15, 0, 0).unwrap());
    assert!(engine.buy_stock(student.id, channel.id, stock.id, 1).is_ok());
}

#[test]
fn test_sell_requires_shares() {
    let (mut engine, _queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    clock.set(trading_hours());
    assert_eq!(
        engine.sell_stock(student.id, channel.id, stock.id, 1),
        Err(EngineError::UserStockNotFound)
    );

    engine.buy_stock(student.id, channel.id, stock.id, 3).unwrap();
    assert_eq!(
        engine.sell_stock(student.id, channel.id, stock.id, 4),
        Err(EngineError::InsufficientShares)
    );
    // nothing moved
    assert_eq!(balance_of(&engine, &channel, &student), 70);
}

#[test]
fn test_insufficient_points_leaves_state_untouched() {
    let (mut engine, _queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 25);

    clock.set(trading_hours());
    assert_eq!(
        engine.buy_stock(student.id, channel.id, stock.id, 3),
        Err(EngineError::InsufficientPoints)
    );
    assert_eq!(balance_of(&engine, &channel, &student), 25);
    assert_eq!(engine.store().trade_infos().count(), 0);
}

#[test]
fn test_catalog_edits_frozen_during_market_hours() {
    let (mut engine, _queue, clock) = engine_at(trading_hours());
    let (teacher, channel) = classroom(&mut engine);

    assert_eq!(
        engine.create_item(teacher.id, channel.id, item_draft(10, 5)),
        Err(EngineError::MarketHoursViolation)
    );
    assert_eq!(
        engine.create_stock(teacher.id, channel.id, stock_draft(10, 0.0)),
        Err(EngineError::MarketHoursViolation)
    );

    clock.set(after_hours());
    assert!(engine.create_item(teacher.id, channel.id, item_draft(10, 5)).is_ok());
}

#[test]
fn test_tax_must_be_a_fraction() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    assert_eq!(
        engine.create_stock(teacher.id, channel.id, stock_draft(10, 1.5)),
        Err(EngineError::InvalidTaxRate)
    );
}

// ============================================================================
// Price staging and rollover
// ============================================================================

#[test]
fn test_price_update_is_staged_until_rollover() {
    let (mut engine, queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();

    let stock = engine
        .update_stock(teacher.id, channel.id, stock.id, stock_draft(14, 0.0))
        .unwrap();
    assert_eq!(stock.purchase_price, 10);
    assert_eq!(stock.next_day_purchase_price, 14);
    assert!(stock.rollover_job.is_some());

    let live = queue.live_jobs();
    assert_eq!(live.len(), 1);
    assert_eq!(
        live[0].job,
        JobKind::PriceRollover {
            stock_id: stock.id,
            channel_id: channel.id,
        }
    );

    engine
        .run_job(&JobKind::PriceRollover {
            stock_id: stock.id,
            channel_id: channel.id,
        })
        .unwrap();
    let stock = engine.store().get_stock(stock.id).unwrap();
    assert_eq!(stock.purchase_price, 14);
    assert_eq!(stock.prev_day_purchase_price, 10);
    assert!(stock.rollover_job.is_none());
}

#[test]
fn test_restaging_replaces_the_scheduled_rollover() {
    let (mut engine, queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();

    let staged = engine
        .update_stock(teacher.id, channel.id, stock.id, stock_draft(14, 0.0))
        .unwrap();
    let first_job = staged.rollover_job.unwrap();
    engine
        .update_stock(teacher.id, channel.id, stock.id, stock_draft(18, 0.0))
        .unwrap();

    assert!(queue.cancelled().contains(&first_job));
    assert_eq!(queue.live_jobs().len(), 1);
}

#[test]
fn test_daily_sweep_writes_one_row_per_stock_per_day() {
    let (mut engine, _queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let stock = engine
        .create_stock(teacher.id, channel.id, stock_draft(10, 0.0))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    clock.set(trading_hours());
    engine.buy_stock(student.id, channel.id, stock.id, 3).unwrap();
    engine.sell_stock(student.id, channel.id, stock.id, 1).unwrap();

    engine.run_job(&JobKind::DailyPriceSweep).unwrap();
    let rows: Vec<_> = engine.store().daily_prices().cloned().collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].stock, stock.id);
    assert_eq!(rows[0].volume, 4);
    assert_eq!(rows[0].transaction_amount, 40);

    // a second sweep on the same day is a no-op for already-covered stocks
    engine.run_job(&JobKind::DailyPriceSweep).unwrap();
    assert_eq!(engine.store().daily_prices().count(), 1);
}

// ============================================================================
// Shop
// ============================================================================

#[test]
fn test_item_purchase_and_use() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let item = engine
        .create_item(teacher.id, channel.id, item_draft(10, 20))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    let inventory = engine
        .buy_item(student.id, channel.id, item.id, 3, 10)
        .unwrap();
    assert_eq!(inventory.amount, 3);
    assert_eq!(balance_of(&engine, &channel, &student), 70);
    assert_eq!(engine.store().get_item(item.id).unwrap().amount, 17);

    let inventory = engine.use_item(student.id, channel.id, item.id, 2).unwrap();
    assert_eq!(inventory.amount, 1);
    assert_eq!(inventory.used_amount, 2);
    assert!(!inventory.is_used());
    assert_eq!(engine.store().user_item_logs().count(), 1);

    let inventory = engine.use_item(student.id, channel.id, item.id, 1).unwrap();
    assert!(inventory.is_used());
    assert_eq!(
        engine.use_item(student.id, channel.id, item.id, 1),
        Err(EngineError::InsufficientUnits)
    );
}

#[test]
fn test_buy_item_guards() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let item = engine
        .create_item(teacher.id, channel.id, item_draft(10, 2))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    // the price the buyer saw must still hold
    assert_eq!(
        engine.buy_item(student.id, channel.id, item.id, 1, 9),
        Err(EngineError::PriceMismatch)
    );
    assert_eq!(
        engine.buy_item(student.id, channel.id, item.id, 3, 10),
        Err(EngineError::InsufficientStock)
    );
    assert_eq!(balance_of(&engine, &channel, &student), 100);
    assert!(engine.store().user_items().next().is_none());
}

#[test]
fn test_repurchase_tops_up_the_same_inventory_row() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let item = engine
        .create_item(teacher.id, channel.id, item_draft(5, 20))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);

    engine.buy_item(student.id, channel.id, item.id, 2, 5).unwrap();
    engine.use_item(student.id, channel.id, item.id, 2).unwrap();
    let inventory = engine.buy_item(student.id, channel.id, item.id, 1, 5).unwrap();

    assert_eq!(engine.store().user_items().count(), 1);
    assert_eq!(inventory.amount, 1);
    assert_eq!(inventory.used_amount, 2);
    assert!(!inventory.is_used());
}

// ============================================================================
// Channel lifecycle
// ============================================================================

#[test]
fn test_entry_codes_are_lowercase_alphanumeric() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (_, channel) = classroom(&mut engine);
    assert_eq!(channel.entry_code.len(), 6);
    assert!(channel
        .entry_code
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
}

#[test]
fn test_one_channel_per_teacher_and_per_student() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");

    assert_eq!(
        engine.create_channel(teacher.id, "second class"),
        Err(EngineError::AlreadyHasChannel)
    );

    let other_teacher = sign_up_teacher(&mut engine, "colleague");
    let other = engine.create_channel(other_teacher.id, "class 3-3").unwrap();
    assert_eq!(
        engine.join_channel(student.id, &other.entry_code),
        Err(EngineError::AlreadyMember)
    );
}

#[test]
fn test_pending_delete_schedules_exactly_one_job() {
    let (mut engine, queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);

    engine.pending_delete_channel(teacher.id, channel.id).unwrap();
    let state = engine.store().get_channel(channel.id).unwrap().state;
    assert!(state.is_pending_deleted());
    assert_eq!(queue.live_jobs().len(), 1);
    assert_eq!(queue.live_jobs()[0].delay, Duration::from_secs(3600));

    // a second call is a no-op and does not schedule again
    engine.pending_delete_channel(teacher.id, channel.id).unwrap();
    assert_eq!(queue.scheduled().len(), 1);
    assert_eq!(engine.store().get_channel(channel.id).unwrap().state, state);
}

#[test]
fn test_pending_deleted_channel_is_invisible_to_join() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = sign_up_student(&mut engine, "mina");

    engine.pending_delete_channel(teacher.id, channel.id).unwrap();
    assert_eq!(
        engine.join_channel(student.id, &channel.entry_code),
        Err(EngineError::InvalidEntryCode)
    );
}

#[test]
fn test_deferred_delete_cascades() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    let item = engine
        .create_item(teacher.id, channel.id, item_draft(10, 20))
        .unwrap();
    grant(&mut engine, &teacher, &channel, &student, 100);
    engine.buy_item(student.id, channel.id, item.id, 1, 10).unwrap();

    engine.pending_delete_channel(teacher.id, channel.id).unwrap();
    engine
        .run_job(&JobKind::DeleteChannel {
            channel_id: channel.id,
        })
        .unwrap();

    assert!(engine.store().get_channel(channel.id).is_none());
    assert!(engine.store().user_channels().next().is_none());
    assert!(engine.store().items().next().is_none());
    assert!(engine.store().user_items().next().is_none());
    // accounts survive the channel
    assert!(engine.store().get_user(student.id).is_some());
}

#[test]
fn test_stale_delete_job_cannot_touch_a_restored_channel() {
    let (mut engine, queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);

    engine.deactivate_account(teacher.id, "pw1234").unwrap();
    assert!(engine
        .store()
        .get_channel(channel.id)
        .unwrap()
        .state
        .is_pending_deleted());

    // signing back in restores the account and the channel
    engine.sign_in("teacher", "pw1234").unwrap();
    assert!(engine.store().get_channel(channel.id).unwrap().is_live());
    assert_eq!(queue.cancelled().len(), 1);

    // a job that still fires finds nothing pending and gives up
    assert_eq!(
        engine.run_job(&JobKind::DeleteChannel {
            channel_id: channel.id,
        }),
        Err(EngineError::ChannelNotFound)
    );
    assert!(engine.store().get_channel(channel.id).is_some());
}

#[test]
fn test_leave_users_is_all_or_nothing() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let mina = enroll(&mut engine, &channel, "mina");
    let juno = enroll(&mut engine, &channel, "juno");
    let outsider = sign_up_student(&mut engine, "outsider");

    assert_eq!(
        engine.leave_users(teacher.id, channel.id, &[mina.id, outsider.id]),
        Err(EngineError::MembershipCountMismatch)
    );
    assert_eq!(engine.store().user_channels().count(), 3);

    engine
        .leave_users(teacher.id, channel.id, &[mina.id, juno.id])
        .unwrap();
    assert_eq!(engine.store().user_channels().count(), 1);
}

#[test]
fn test_owner_is_never_a_grant_or_removal_target() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");

    assert_eq!(
        engine.leave_users(teacher.id, channel.id, &[teacher.id]),
        Err(EngineError::CannotRemoveOwner)
    );
    assert_eq!(
        engine.give_point_to_users(teacher.id, channel.id, &[student.id, teacher.id], 10),
        Err(EngineError::CannotRemoveOwner)
    );
    assert_eq!(balance_of(&engine, &channel, &student), 0);
}

#[test]
fn test_point_grant_overflow_rolls_the_batch_back() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let mina = enroll(&mut engine, &channel, "mina");
    let juno = enroll(&mut engine, &channel, "juno");
    grant(&mut engine, &teacher, &channel, &mina, u64::MAX);

    assert_eq!(
        engine.give_point_to_users(teacher.id, channel.id, &[juno.id, mina.id], 1),
        Err(EngineError::Overflow)
    );
    // the earlier member of the batch was not credited either
    assert_eq!(balance_of(&engine, &channel, &juno), 0);
    assert_eq!(balance_of(&engine, &channel, &mina), u64::MAX);
}

#[test]
fn test_grant_emits_ledger_events() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");
    engine.take_events();

    grant(&mut engine, &teacher, &channel, &student, 40);
    let events = engine.take_events();
    assert!(events.contains(&Event::PointsGranted {
        channel_id: channel.id,
        user: student.id,
        amount: 40,
        new_balance: 40,
    }));
    assert!(events.iter().all(Event::is_ledger_event));
}

// ============================================================================
// Accounts
// ============================================================================

#[test]
fn test_teacher_signup_consumes_the_verification_code() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    sign_up_teacher(&mut engine, "teacher");

    // same code again is spent
    assert_eq!(
        engine.sign_up(UserDraft {
            username: "other".to_string(),
            nickname: "other".to_string(),
            password: "pw1234".to_string(),
            role: Role::Teacher,
            verification_code: Some("code-teacher".to_string()),
        }),
        Err(EngineError::InvalidVerificationCode)
    );
    assert_eq!(
        engine.sign_up(UserDraft {
            username: "third".to_string(),
            nickname: "third".to_string(),
            password: "pw1234".to_string(),
            role: Role::Teacher,
            verification_code: None,
        }),
        Err(EngineError::InvalidVerificationCode)
    );
}

#[test]
fn test_usernames_are_unique_across_states() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let student = sign_up_student(&mut engine, "mina");
    engine.deactivate_account(student.id, "pw1234").unwrap();

    // a deactivated account still holds its username
    assert_eq!(
        engine
            .sign_up(UserDraft {
                username: "mina".to_string(),
                nickname: "someone else".to_string(),
                password: "pw1234".to_string(),
                role: Role::Student,
                verification_code: None,
            })
            .unwrap_err(),
        EngineError::UsernameTaken
    );
}

#[test]
fn test_student_deactivation_leaves_the_channel() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (_, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");

    assert_eq!(
        engine.deactivate_account(student.id, "wrong"),
        Err(EngineError::InvalidPassword)
    );
    engine.deactivate_account(student.id, "pw1234").unwrap();

    assert!(!engine.store().get_user(student.id).unwrap().is_active());
    assert!(engine
        .store()
        .user_channels()
        .all(|uc| uc.user != student.id));

    // signing back in restores the account but not the membership
    let restored = engine.sign_in("mina", "pw1234").unwrap();
    assert_eq!(restored.id, student.id);
    assert!(engine.store().get_user(student.id).unwrap().is_active());
}

#[test]
fn test_purge_removes_accounts_past_the_grace_window() {
    let (mut engine, queue, clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);
    let student = enroll(&mut engine, &channel, "mina");

    engine.deactivate_account(teacher.id, "pw1234").unwrap();
    engine.deactivate_account(student.id, "pw1234").unwrap();

    // still inside the window: nothing happens
    clock.advance_secs(6 * 24 * 3600);
    engine.run_job(&JobKind::PurgeUsers).unwrap();
    assert!(engine.store().get_user(teacher.id).is_some());

    clock.advance_secs(2 * 24 * 3600);
    engine.run_job(&JobKind::PurgeUsers).unwrap();
    assert!(engine.store().get_user(teacher.id).is_none());
    assert!(engine.store().get_user(student.id).is_none());
    // the owned channel went with the owner, and its pending delete was
    // cancelled rather than left to fire against nothing
    assert!(engine.store().get_channel(channel.id).is_none());
    assert!(!queue.cancelled().is_empty());
}

#[test]
fn test_channel_state_survives_unrelated_failures() {
    let (mut engine, _queue, _clock) = engine_at(after_hours());
    let (teacher, channel) = classroom(&mut engine);

    assert_eq!(
        engine.update_channel_name(teacher.id, channel.id + 999, "renamed"),
        Err(EngineError::ChannelNotFound)
    );
    let stored = engine.store().get_channel(channel.id).unwrap();
    assert_eq!(stored.name, "class 3-2");
    assert_eq!(stored.state, ChannelState::Active);
}
