pub mod core;
pub mod analysis;
pub mod index;
pub mod search;
pub mod query;
pub mod parallel;
pub mod crawler;
pub mod export;
pub mod server;

/*
┌──────────────────────────────────────────────────────────────────────────────────┐
│                              WEBDEX ARCHITECTURE                                  │
└──────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── SOURCES ─────────────────────────────────────────┐
│                                                                                   │
│  IndexBuilder (sequential)        ConcurrentIndexBuilder         Crawler          │
│  walk dir → index_file → add      one task per file:             one task per URL │
│                                   local index → add_all          fetch → links →  │
│                                                                  visited (capped) │
│                                                                  → local → add_all│
└───────────────────────────────────────────────────────────────────────────────────┘
                 │                               │                        │
                 ▼                               ▼                        ▼
┌──────────────────────────────── INDEX ───────────────────────────────────────────┐
│                                                                                   │
│  InvertedIndex                                                                    │
│    terms:  BTreeMap<term, BTreeMap<location, BTreeSet<position>>>                 │
│    counts: BTreeMap<location, token count>                                        │
│                                                                                   │
│  ConcurrentInvertedIndex = ReadWriteLock + InvertedIndex                          │
│    add / add_all        → write lock                                              │
│    contains / search    → read lock                                               │
└───────────────────────────────────────────────────────────────────────────────────┘
                 │
                 ▼
┌──────────────────────────────── CONSUMERS ───────────────────────────────────────┐
│                                                                                   │
│  QueryProcessor / ConcurrentQueryProcessor   line → unique stems → key → search   │
│  export::json                                index, counts, results               │
│  server                                      GET form + history, POST /search     │
└───────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── EXECUTION ───────────────────────────────────────┐
│                                                                                   │
│  WorkQueue: N workers, FIFO tasks, pending counter, finish() barrier,             │
│             failures channel                                                      │
└───────────────────────────────────────────────────────────────────────────────────┘
*/
