pub mod scrape_cycle;
