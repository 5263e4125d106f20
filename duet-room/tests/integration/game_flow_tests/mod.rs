pub mod test_host_starts_game;
pub mod test_role_follows_presence;
pub mod test_start_play_reaches_all_members;
