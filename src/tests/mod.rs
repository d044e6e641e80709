mod test_utils;

mod plan_store_test;
mod replay_test;
