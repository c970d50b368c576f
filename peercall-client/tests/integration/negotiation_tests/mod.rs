mod test_answer_routing;
