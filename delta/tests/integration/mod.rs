mod blob_comparison_test;
mod prefix_tree_test;
mod queue_test;
mod search_test;
mod table_comparison_test;
