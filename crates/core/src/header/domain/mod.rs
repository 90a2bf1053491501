pub mod cih_record;
