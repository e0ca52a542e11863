pub mod u501_sync_from_winestro;
