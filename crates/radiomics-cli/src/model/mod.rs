pub mod split_record;
